//! # glossa-rs: glossary clustering and agreement tracking
//!
//! Partitions the terms of a glossary two independent ways and measures how
//! well the two groupings agree:
//!
//! - **Graph partition**: terms are nodes, references are undirected edges,
//!   and communities come from seeded multi-level Louvain modularity
//!   optimization.
//! - **Semantic partition**: definitions are TF-IDF vectors clustered with
//!   seeded k-means++.
//! - **Agreement**: the Adjusted Rand Index between the two partitions,
//!   appended to a per-run history so the score can be tracked over time.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 bin/glossa (clap CLI)                     │
//! ├───────────────────────────────────────────────────────────┤
//! │  core::pipeline  (ClusterPipeline, Workspace)             │
//! ├──────────────┬──────────────────┬─────────────────────────┤
//! │  clustering  │  evaluation      │  io                     │
//! │ • graph      │ • agreement      │ • paths  • artifacts    │
//! │ • community  │                  │ • history • reports     │
//! │ • tfidf      │                  │                         │
//! │ • kmeans     │                  │                         │
//! │ • semantic   │                  │                         │
//! ├──────────────┴──────────────────┴─────────────────────────┤
//! │  core: errors, config, glossary, partition, run_context   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use glossa_rs::{ClusterPipeline, GlossaConfig, Glossary, RunContext};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let glossary = Glossary::load("data/aiml_glossary.json")?;
//!     let mut ctx = RunContext::new("example");
//!
//!     let results = ClusterPipeline::new(GlossaConfig::default()).run(&glossary, &mut ctx)?;
//!     println!("ARI = {:.4}", results.agreement.adjusted_rand_index);
//!     Ok(())
//! }
//! ```

#![warn(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core data model, configuration and orchestration
pub mod core {
    //! Core data structures, configuration and stage orchestration.

    pub mod config;
    pub mod errors;
    pub mod glossary;
    pub mod partition;
    pub mod pipeline;
    pub mod run_context;
}

// Partitioning algorithms
pub mod clustering {
    //! Graph and definition-similarity partitioners.

    pub mod community;
    pub mod graph;
    pub mod kmeans;
    pub mod semantic;
    pub mod tfidf;
}

// Partition comparison
pub mod evaluation {
    //! Agreement statistics between partitions.

    pub mod agreement;
}

// Artifact I/O and reporting
pub mod io {
    //! Resource resolution, artifact sinks, history and reports.

    pub mod artifacts;
    pub mod history;
    pub mod paths;
    pub mod reports;
}

// Re-export primary types for convenience
pub use crate::clustering::community::{CommunityDetection, LouvainDetector};
pub use crate::clustering::graph::{GraphStats, RelationshipGraph};
pub use crate::clustering::semantic::{SemanticClustering, SemanticPartitioner};
pub use crate::core::config::{EdgeWeighting, GlossaConfig};
pub use crate::core::errors::{GlossaError, Result, ResultExt};
pub use crate::core::glossary::{Glossary, Term};
pub use crate::core::partition::{ClusterId, Partition};
pub use crate::core::pipeline::{ClusterPipeline, PipelineResults, Workspace};
pub use crate::core::run_context::{Diagnostics, RunContext, RunRecord};
pub use crate::evaluation::agreement::{adjusted_rand_index, AgreementRecord};
pub use crate::io::paths::ResourcePaths;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
