//! Semantic partitioning of the glossary by definition text.
//!
//! Definitions are vectorized with TF-IDF and clustered with k-means. The
//! relationship graph plays no part here.

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::clustering::kmeans::{KMeans, KMeansConfig};
use crate::clustering::tfidf::{CorpusStatistics, TfIdfVectorizer};
use crate::core::config::SemanticConfig;
use crate::core::errors::Result;
use crate::core::glossary::Glossary;
use crate::core::partition::Partition;
use crate::core::run_context::RunContext;

/// Semantic partition plus the numbers worth reporting about it
#[derive(Debug, Clone)]
pub struct SemanticClustering {
    pub partition: Partition,
    pub inertia: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Cluster count actually used after clamping to the number of terms
    pub k_effective: usize,
    pub corpus: CorpusStatistics,
}

/// Serializable summary written as `semantic_stats.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticStats {
    pub k_requested: usize,
    pub k_effective: usize,
    pub clusters: usize,
    pub inertia: f64,
    pub iterations: usize,
    pub converged: bool,
    pub corpus: CorpusStatistics,
    /// Parameters the stage ran with, read back by a later evaluation
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl SemanticClustering {
    pub fn stats(&self, k_requested: usize) -> SemanticStats {
        SemanticStats {
            k_requested,
            k_effective: self.k_effective,
            clusters: self.partition.num_clusters(),
            inertia: self.inertia,
            iterations: self.iterations,
            converged: self.converged,
            corpus: self.corpus.clone(),
            params: BTreeMap::new(),
        }
    }
}

/// TF-IDF + k-means partitioner
#[derive(Debug, Clone)]
pub struct SemanticPartitioner {
    config: SemanticConfig,
}

impl SemanticPartitioner {
    pub fn new(config: SemanticConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SemanticConfig {
        &self.config
    }

    /// Partition every term of the glossary by its definition
    pub fn partition(&self, glossary: &Glossary, ctx: &mut RunContext) -> Result<SemanticClustering> {
        let empty_definitions = glossary.empty_definition_count();
        ctx.record_empty_definitions(empty_definitions);
        if empty_definitions > 0 {
            tracing::warn!(
                "{} terms have no definition text and are clustered as zero vectors",
                empty_definitions
            );
        }

        let definitions: Vec<&str> = glossary.terms().map(|term| term.definition.as_str()).collect();
        let mut vectorizer = TfIdfVectorizer::new(self.config.stop_words, self.config.min_token_len);
        let (vectors, corpus) = vectorizer.fit_transform(&definitions);

        let k_effective = self.config.k.min(glossary.len());
        ctx.log_param("semantic.k", self.config.k);
        ctx.log_param("semantic.k_effective", k_effective);
        ctx.log_param("semantic.seed", self.config.seed);
        ctx.log_param("semantic.n_init", self.config.n_init);
        ctx.log_metric("semantic.vocabulary_size", corpus.vocabulary_size as f64);

        if glossary.is_empty() {
            return Ok(SemanticClustering {
                partition: Partition::new(),
                inertia: 0.0,
                iterations: 0,
                converged: true,
                k_effective: 0,
                corpus,
            });
        }

        if k_effective < self.config.k {
            tracing::warn!(
                "Requested k={} exceeds the {} terms; using k={}",
                self.config.k,
                glossary.len(),
                k_effective
            );
        }

        let width = vectorizer.vocabulary_size();
        let mut data = Array2::<f64>::zeros((vectors.len(), width));
        for (row, vector) in vectors.iter().enumerate() {
            for &(feature, weight) in vector.entries() {
                data[[row, feature]] = weight;
            }
        }

        let kmeans = KMeans::new(KMeansConfig::from_semantic(&self.config, k_effective)?);
        let result = kmeans.fit(data.view())?;

        let partition = Partition::from_labels(glossary.ids(), &result.labels)?.canonicalize();

        ctx.log_metric("semantic.inertia", result.inertia);
        ctx.log_metric("semantic.iterations", result.iterations as f64);
        ctx.log_metric("semantic.clusters", partition.num_clusters() as f64);

        tracing::info!(
            "Semantic clustering: {} terms into {} clusters (k={}), inertia = {:.6}",
            glossary.len(),
            partition.num_clusters(),
            k_effective,
            result.inertia
        );

        Ok(SemanticClustering {
            partition,
            inertia: result.inertia,
            iterations: result.iterations,
            converged: result.converged,
            k_effective,
            corpus,
        })
    }
}
