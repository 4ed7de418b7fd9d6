//! Agreement between two partitions of the same terms.
//!
//! The score is the Adjusted Rand Index: pair-counting agreement corrected
//! for chance, 1.0 for identical groupings and 0.0 in expectation for
//! independent random ones. It only looks at groupings, so relabelling
//! either partition never changes it.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::{GlossaError, Result};
use crate::core::partition::{ClusterId, Partition};
use crate::core::run_context::RunContext;

/// Cross-tabulation of two partitions over the same identifiers.
///
/// Rows are clusters of the left partition and columns clusters of the right
/// one, both in order of first appearance along the left partition's ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyTable {
    counts: Vec<Vec<usize>>,
    row_sums: Vec<usize>,
    col_sums: Vec<usize>,
    total: usize,
}

impl ContingencyTable {
    /// Tabulate two partitions; their identifier sets must be identical
    pub fn from_partitions(left: &Partition, right: &Partition) -> Result<Self> {
        ensure_aligned(left, right)?;

        let mut row_index: HashMap<ClusterId, usize> = HashMap::new();
        let mut col_index: HashMap<ClusterId, usize> = HashMap::new();
        let mut cells: Vec<(usize, usize)> = Vec::with_capacity(left.len());

        for (id, left_label) in left.iter() {
            let right_label = right
                .label_of(id)
                .ok_or_else(|| GlossaError::internal(format!("'{id}' missing after alignment check")))?;
            let next_row = row_index.len();
            let row = *row_index.entry(left_label).or_insert(next_row);
            let next_col = col_index.len();
            let col = *col_index.entry(right_label).or_insert(next_col);
            cells.push((row, col));
        }

        let mut counts = vec![vec![0; col_index.len()]; row_index.len()];
        let mut row_sums = vec![0; row_index.len()];
        let mut col_sums = vec![0; col_index.len()];
        for (row, col) in cells {
            counts[row][col] += 1;
            row_sums[row] += 1;
            col_sums[col] += 1;
        }

        Ok(Self {
            counts,
            row_sums,
            col_sums,
            total: left.len(),
        })
    }

    pub fn rows(&self) -> usize {
        self.row_sums.len()
    }

    pub fn cols(&self) -> usize {
        self.col_sums.len()
    }

    pub fn count(&self, row: usize, col: usize) -> usize {
        self.counts
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(0)
    }

    pub fn row_sums(&self) -> &[usize] {
        &self.row_sums
    }

    pub fn col_sums(&self) -> &[usize] {
        &self.col_sums
    }

    /// Number of identifiers tabulated
    pub fn total(&self) -> usize {
        self.total
    }

    /// Adjusted Rand Index of the tabulated partitions
    pub fn adjusted_rand_index(&self) -> f64 {
        if self.total < 2 {
            return 1.0;
        }

        let index: f64 = self.counts.iter().flatten().map(|&x| comb2(x)).sum();
        let sum_a: f64 = self.row_sums.iter().map(|&x| comb2(x)).sum();
        let sum_b: f64 = self.col_sums.iter().map(|&x| comb2(x)).sum();
        let expected = sum_a * sum_b / comb2(self.total);
        let max_index = 0.5 * (sum_a + sum_b);

        let denominator = max_index - expected;
        if denominator.abs() < f64::EPSILON {
            // Both all-singletons or both one cluster: the groupings coincide
            1.0
        } else {
            (index - expected) / denominator
        }
    }
}

/// C(n, 2)
fn comb2(n: usize) -> f64 {
    if n < 2 {
        0.0
    } else {
        (n as f64) * (n as f64 - 1.0) / 2.0
    }
}

/// Both partitions must label exactly the same identifiers
fn ensure_aligned(left: &Partition, right: &Partition) -> Result<()> {
    let (only_left, only_right) = left.universe_difference(right);
    if only_left.is_empty() && only_right.is_empty() {
        Ok(())
    } else {
        Err(GlossaError::alignment(
            format!(
                "partitions cover different terms ({} vs {})",
                left.len(),
                right.len()
            ),
            only_left,
            only_right,
        ))
    }
}

/// Adjusted Rand Index between two partitions of the same identifiers.
///
/// Returns an alignment error carrying the symmetric difference when the
/// identifier sets differ.
pub fn adjusted_rand_index(left: &Partition, right: &Partition) -> Result<f64> {
    Ok(ContingencyTable::from_partitions(left, right)?.adjusted_rand_index())
}

/// One entry of the agreement history; written once, never rewritten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementRecord {
    pub run_id: Uuid,
    pub run_name: String,
    pub timestamp: DateTime<Utc>,
    pub adjusted_rand_index: f64,
    pub graph_clusters: usize,
    pub semantic_clusters: usize,
    pub num_terms: usize,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

/// Score the graph partition against the semantic partition and record the
/// result on the run
pub fn evaluate(graph: &Partition, semantic: &Partition, ctx: &mut RunContext) -> Result<AgreementRecord> {
    let score = adjusted_rand_index(graph, semantic)?;
    ctx.log_metric("adjusted_rand_index", score);
    ctx.log_param("num_terms", graph.len());

    tracing::info!(
        "Adjusted Rand Index between graph ({} clusters) and semantic ({} clusters) partitions: {:.4}",
        graph.num_clusters(),
        semantic.num_clusters(),
        score
    );

    Ok(AgreementRecord {
        run_id: ctx.run_id(),
        run_name: ctx.run_name().to_string(),
        timestamp: Utc::now(),
        adjusted_rand_index: score,
        graph_clusters: graph.num_clusters(),
        semantic_clusters: semantic.num_clusters(),
        num_terms: graph.len(),
        params: ctx.params().clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn partition(ids: &[&str], labels: &[ClusterId]) -> Partition {
        Partition::from_labels(ids.iter().copied(), labels).unwrap()
    }

    const IDS: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

    #[test]
    fn identical_groupings_score_one() {
        let p = partition(&IDS, &[0, 0, 1, 1, 2, 2]);
        let relabelled = partition(&IDS, &[5, 5, 3, 3, 9, 9]);
        assert_relative_eq!(adjusted_rand_index(&p, &p).unwrap(), 1.0);
        assert_relative_eq!(adjusted_rand_index(&p, &relabelled).unwrap(), 1.0);
    }

    #[test]
    fn known_value() {
        // sklearn: adjusted_rand_score([0,0,1,1],[0,0,1,2]) == 0.5714285714285715
        let ids = ["a", "b", "c", "d"];
        let p = partition(&ids, &[0, 0, 1, 1]);
        let q = partition(&ids, &[0, 0, 1, 2]);
        assert_relative_eq!(adjusted_rand_index(&p, &q).unwrap(), 4.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn disagreement_can_be_negative() {
        let ids = ["a", "b", "c", "d"];
        let p = partition(&ids, &[0, 0, 1, 1]);
        let q = partition(&ids, &[0, 1, 0, 1]);
        assert_relative_eq!(adjusted_rand_index(&p, &q).unwrap(), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn symmetric() {
        let p = partition(&IDS, &[0, 0, 0, 1, 1, 2]);
        let q = partition(&IDS, &[1, 0, 0, 1, 2, 2]);
        assert_eq!(
            adjusted_rand_index(&p, &q).unwrap(),
            adjusted_rand_index(&q, &p).unwrap()
        );
    }

    #[test]
    fn order_of_identifiers_is_irrelevant() {
        let p = partition(&["a", "b", "c", "d"], &[0, 0, 1, 1]);
        let q = partition(&["d", "c", "b", "a"], &[7, 7, 2, 2]);
        assert_relative_eq!(adjusted_rand_index(&p, &q).unwrap(), 1.0);
    }

    #[test]
    fn degenerate_partitions() {
        let singletons = partition(&IDS, &[0, 1, 2, 3, 4, 5]);
        let single = partition(&IDS, &[0; 6]);
        assert_relative_eq!(adjusted_rand_index(&singletons, &singletons).unwrap(), 1.0);
        assert_relative_eq!(adjusted_rand_index(&single, &single).unwrap(), 1.0);
        assert_relative_eq!(adjusted_rand_index(&singletons, &single).unwrap(), 0.0);

        let one = partition(&["x"], &[0]);
        assert_relative_eq!(adjusted_rand_index(&one, &one).unwrap(), 1.0);
        assert_relative_eq!(adjusted_rand_index(&Partition::new(), &Partition::new()).unwrap(), 1.0);
    }

    #[test]
    fn relabelled_three_two_split_scores_one() {
        let ids = ["t1", "t2", "t3", "t4", "t5"];
        let graph = partition(&ids, &[0, 0, 0, 1, 1]);
        let semantic = partition(&ids, &[1, 1, 1, 0, 0]);
        assert_relative_eq!(adjusted_rand_index(&graph, &semantic).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn one_cluster_against_all_singletons_scores_zero() {
        let ids = ["t1", "t2", "t3", "t4"];
        let single = partition(&ids, &[0, 0, 0, 0]);
        let singletons = partition(&ids, &[0, 1, 2, 3]);
        assert_relative_eq!(adjusted_rand_index(&single, &singletons).unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(adjusted_rand_index(&singletons, &single).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn mismatched_universes_are_an_alignment_error() {
        let p = partition(&["a", "b", "c"], &[0, 0, 1]);
        let q = partition(&["a", "b", "d"], &[0, 1, 1]);

        match adjusted_rand_index(&p, &q).unwrap_err() {
            GlossaError::Alignment {
                only_left,
                only_right,
                ..
            } => {
                assert_eq!(only_left, vec!["c"]);
                assert_eq!(only_right, vec!["d"]);
            }
            other => panic!("Expected alignment error, got {other:?}"),
        }
    }

    #[test]
    fn contingency_table_layout() {
        let p = partition(&["a", "b", "c", "d"], &[3, 3, 1, 1]);
        let q = partition(&["a", "b", "c", "d"], &[0, 1, 1, 1]);
        let table = ContingencyTable::from_partitions(&p, &q).unwrap();

        assert_eq!((table.rows(), table.cols()), (2, 2));
        assert_eq!(table.count(0, 0), 1);
        assert_eq!(table.count(0, 1), 1);
        assert_eq!(table.count(1, 1), 2);
        assert_eq!(table.row_sums(), &[2, 2]);
        assert_eq!(table.col_sums(), &[1, 3]);
        assert_eq!(table.total(), 4);
    }

    #[test]
    fn evaluate_records_metric_and_params() {
        let mut ctx = RunContext::new("eval");
        ctx.log_param("semantic.k", 2);
        let p = partition(&["a", "b"], &[0, 0]);
        let record = evaluate(&p, &p, &mut ctx).unwrap();

        assert_eq!(record.run_id, ctx.run_id());
        assert_eq!(record.num_terms, 2);
        assert_eq!(ctx.metric("adjusted_rand_index"), Some(1.0));
        assert_eq!(record.params.get("semantic.k"), Some(&serde_json::json!(2)));
    }
}
