//! Partitioner configuration types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::errors::Result;

use super::validation::{validate_non_negative, validate_positive_f64, validate_positive_usize};

/// How references between two terms translate into an undirected edge weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeWeighting {
    /// One edge of weight 1.0 whenever either term references the other
    #[default]
    Binary,
    /// Every distinct directed reference adds 1.0 to the pair's edge weight
    ReferenceCount,
}

impl EdgeWeighting {
    /// Stable name used in run parameters and config files
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::ReferenceCount => "reference_count",
        }
    }
}

impl fmt::Display for EdgeWeighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship graph and Louvain settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Edge weighting policy
    #[serde(default)]
    pub edge_weighting: EdgeWeighting,

    /// Seed for the node visiting order
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Louvain resolution parameter (higher = more communities)
    #[serde(default = "default_resolution")]
    pub resolution: f64,

    /// Maximum number of local-moving/aggregation passes
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,

    /// Minimum modularity gain for another pass
    #[serde(default = "default_min_improvement")]
    pub min_improvement: f64,
}

/// Definition-similarity partitioning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Number of target clusters
    #[serde(default = "default_k")]
    pub k: usize,

    /// Seed for centroid initialization
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Maximum Lloyd iterations per initialization
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Convergence threshold on total centroid shift
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Number of seeded initializations; the lowest inertia wins
    #[serde(default = "default_n_init")]
    pub n_init: usize,

    /// Drop English stop words before weighting
    #[serde(default = "default_stop_words")]
    pub stop_words: bool,

    /// Minimum token length in characters
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
}

fn default_seed() -> u64 {
    42
}

fn default_resolution() -> f64 {
    1.0
}

fn default_max_passes() -> usize {
    100
}

fn default_min_improvement() -> f64 {
    1e-7
}

fn default_k() -> usize {
    8
}

fn default_max_iterations() -> usize {
    300
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_n_init() -> usize {
    1
}

fn default_stop_words() -> bool {
    true
}

fn default_min_token_len() -> usize {
    2
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            edge_weighting: EdgeWeighting::default(),
            seed: default_seed(),
            resolution: default_resolution(),
            max_passes: default_max_passes(),
            min_improvement: default_min_improvement(),
        }
    }
}

impl GraphConfig {
    /// Validate graph settings
    pub fn validate(&self) -> Result<()> {
        validate_positive_f64(self.resolution, "graph.resolution")?;
        validate_positive_usize(self.max_passes, "graph.max_passes")?;
        validate_non_negative(self.min_improvement, "graph.min_improvement")?;
        Ok(())
    }
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            seed: default_seed(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            n_init: default_n_init(),
            stop_words: default_stop_words(),
            min_token_len: default_min_token_len(),
        }
    }
}

impl SemanticConfig {
    /// Validate semantic settings
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.k, "semantic.k")?;
        validate_positive_usize(self.max_iterations, "semantic.max_iterations")?;
        validate_positive_f64(self.tolerance, "semantic.tolerance")?;
        validate_positive_usize(self.n_init, "semantic.n_init")?;
        validate_positive_usize(self.min_token_len, "semantic.min_token_len")?;
        Ok(())
    }
}
