//! Partitions: an assignment of cluster labels to a set of term identifiers.
//!
//! Label values carry no meaning across methods or runs; only the grouping
//! does. Comparisons therefore go through [`Partition::equivalence_classes`]
//! or [`Partition::canonicalize`], never through raw label integers.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::errors::{GlossaError, Result};

/// Cluster label
pub type ClusterId = usize;

/// Term identifier → cluster label, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    labels: IndexMap<String, ClusterId>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zip identifiers with labels; both sequences must have the same length
    pub fn from_labels<I, S>(ids: I, labels: &[ClusterId]) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.len() != labels.len() {
            return Err(GlossaError::internal(format!(
                "{} identifiers but {} labels",
                ids.len(),
                labels.len()
            )));
        }

        let mut partition = Self::new();
        for (id, &label) in ids.into_iter().zip(labels) {
            partition.insert(id, label)?;
        }
        Ok(partition)
    }

    /// Assign a label; each identifier may appear only once
    pub fn insert(&mut self, id: impl Into<String>, label: ClusterId) -> Result<()> {
        let id = id.into();
        if self.labels.contains_key(&id) {
            return Err(GlossaError::internal(format!(
                "identifier '{id}' assigned twice"
            )));
        }
        self.labels.insert(id, label);
        Ok(())
    }

    pub fn label_of(&self, id: &str) -> Option<ClusterId> {
        self.labels.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.labels.contains_key(id)
    }

    /// Identifiers in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    /// (identifier, label) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ClusterId)> {
        self.labels.iter().map(|(id, &label)| (id.as_str(), label))
    }

    /// Number of distinct labels
    pub fn num_clusters(&self) -> usize {
        self.labels.values().collect::<BTreeSet<_>>().len()
    }

    /// Members per label
    pub fn cluster_sizes(&self) -> BTreeMap<ClusterId, usize> {
        let mut sizes = BTreeMap::new();
        for &label in self.labels.values() {
            *sizes.entry(label).or_insert(0) += 1;
        }
        sizes
    }

    /// Members grouped by label, each group in insertion order
    pub fn clusters(&self) -> BTreeMap<ClusterId, Vec<&str>> {
        let mut clusters: BTreeMap<ClusterId, Vec<&str>> = BTreeMap::new();
        for (id, &label) in &self.labels {
            clusters.entry(label).or_default().push(id.as_str());
        }
        clusters
    }

    /// The grouping with labels erased
    pub fn equivalence_classes(&self) -> BTreeSet<BTreeSet<String>> {
        let mut groups: HashMap<ClusterId, BTreeSet<String>> = HashMap::new();
        for (id, &label) in &self.labels {
            groups.entry(label).or_default().insert(id.clone());
        }
        groups.into_values().collect()
    }

    /// Relabel clusters 0, 1, 2, ... in order of first appearance
    pub fn canonicalize(&self) -> Self {
        let mut mapping: HashMap<ClusterId, ClusterId> = HashMap::new();
        let labels = self
            .labels
            .iter()
            .map(|(id, label)| {
                let next = mapping.len();
                (id.clone(), *mapping.entry(*label).or_insert(next))
            })
            .collect();
        Self { labels }
    }

    /// Whether both partitions induce the same grouping of the same identifiers
    pub fn same_grouping(&self, other: &Partition) -> bool {
        self.equivalence_classes() == other.equivalence_classes()
    }

    /// Identifiers only in `self` and identifiers only in `other`, each sorted
    pub fn universe_difference(&self, other: &Partition) -> (Vec<String>, Vec<String>) {
        let mut only_self: Vec<String> = self
            .ids()
            .filter(|id| !other.contains(id))
            .map(str::to_string)
            .collect();
        let mut only_other: Vec<String> = other
            .ids()
            .filter(|id| !self.contains(id))
            .map(str::to_string)
            .collect();
        only_self.sort();
        only_other.sort();
        (only_self, only_other)
    }
}
