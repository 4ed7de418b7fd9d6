//! Coverage and trend views over a glossary and its agreement history.

use serde::{Deserialize, Serialize};

use crate::core::errors::Result;
use crate::core::glossary::Glossary;
use crate::evaluation::agreement::AgreementRecord;

/// How many terms link to at least one other term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub total_terms: usize,
    pub covered_terms: usize,
    /// Percentage rounded to two decimals
    pub coverage_percent: f64,
}

impl CoverageReport {
    /// A term is covered when it has a resolved reference to another term
    pub fn from_glossary(glossary: &Glossary) -> Result<Self> {
        let resolution = glossary.resolve_references(false)?;
        let total_terms = glossary.len();
        let covered_terms = resolution.terms_with_references();
        let coverage_percent = if total_terms == 0 {
            0.0
        } else {
            round2(covered_terms as f64 / total_terms as f64 * 100.0)
        };

        Ok(Self {
            total_terms,
            covered_terms,
            coverage_percent,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summary of agreement scores across runs, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub runs: usize,
    pub first: f64,
    pub last: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Last score minus the one before it
    pub delta: Option<f64>,
}

impl TrendSummary {
    /// `None` for an empty history
    pub fn from_history(records: &[AgreementRecord]) -> Option<Self> {
        let scores: Vec<f64> = records.iter().map(|r| r.adjusted_rand_index).collect();
        let (&first, &last) = (scores.first()?, scores.last()?);

        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let delta = (scores.len() >= 2).then(|| last - scores[scores.len() - 2]);

        Some(Self {
            runs: scores.len(),
            first,
            last,
            min,
            max,
            mean,
            delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::glossary::Term;
    use approx::assert_relative_eq;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(score: f64) -> AgreementRecord {
        AgreementRecord {
            run_id: Uuid::new_v4(),
            run_name: "trend".to_string(),
            timestamp: Utc::now(),
            adjusted_rand_index: score,
            graph_clusters: 1,
            semantic_clusters: 1,
            num_terms: 1,
            params: Default::default(),
        }
    }

    #[test]
    fn coverage_counts_terms_with_resolved_references() {
        let glossary = Glossary::from_terms([
            Term::new("A", "A", "a").with_references(["B"]),
            Term::new("B", "B", "b").with_references(["ghost"]),
            Term::new("C", "C", "c"),
        ])
        .unwrap();
        let report = CoverageReport::from_glossary(&glossary).unwrap();

        assert_eq!(report.total_terms, 3);
        assert_eq!(report.covered_terms, 1);
        assert_relative_eq!(report.coverage_percent, 33.33);
    }

    #[test]
    fn coverage_of_empty_glossary_is_zero() {
        let report = CoverageReport::from_glossary(&Glossary::new()).unwrap();
        assert_eq!(report.coverage_percent, 0.0);
    }

    #[test]
    fn trend_summary() {
        let records: Vec<_> = [0.2, 0.5, 0.35].into_iter().map(record).collect();
        let trend = TrendSummary::from_history(&records).unwrap();

        assert_eq!(trend.runs, 3);
        assert_relative_eq!(trend.first, 0.2);
        assert_relative_eq!(trend.max, 0.5);
        assert_relative_eq!(trend.mean, 0.35, epsilon = 1e-12);
        assert_relative_eq!(trend.delta.unwrap(), -0.15, epsilon = 1e-12);
        assert!(TrendSummary::from_history(&records[..1]).unwrap().delta.is_none());
        assert!(TrendSummary::from_history(&[]).is_none());
    }
}
