//! Stage orchestration.
//!
//! [`ClusterPipeline`] runs the whole computation on in-memory data: build the
//! relationship graph, partition it and the definitions, then score their
//! agreement. [`Workspace`] wraps the same stages with artifact I/O so each
//! one can be invoked on its own, reading what the previous stage wrote.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use tracing::{info, warn};

use crate::clustering::community::{CommunityDetection, LouvainDetector};
use crate::clustering::graph::{GraphStats, RelationshipGraph};
use crate::clustering::semantic::{SemanticClustering, SemanticPartitioner};
use crate::core::config::GlossaConfig;
use crate::core::errors::Result;
use crate::core::glossary::{Glossary, ValidationSummary};
use crate::core::run_context::RunContext;
use crate::evaluation::agreement::{self, AgreementRecord};
use crate::io::artifacts;
use crate::io::history;
use crate::io::paths::ResourcePaths;
use crate::io::reports::CoverageReport;

/// Logical names of the artifacts each stage writes
pub mod uris {
    pub const GRAPH_PARTITION: &str = "output:cluster_assignments.csv";
    pub const SEMANTIC_PARTITION: &str = "output:semantic_clusters.csv";
    pub const GRAPH_STATS: &str = "output:graph_stats.json";
    pub const SEMANTIC_STATS: &str = "output:semantic_stats.json";
    pub const AGREEMENT: &str = "output:ari_metrics.json";
    pub const COVERAGE: &str = "output:coverage_report.json";
    pub const GRAPH_DOT: &str = "visualizations:glossary_graph.dot";
}

/// Everything one in-memory run produces
#[derive(Debug, Clone)]
pub struct PipelineResults {
    pub graph: RelationshipGraph,
    pub graph_stats: GraphStats,
    pub graph_clustering: CommunityDetection,
    pub semantic_clustering: SemanticClustering,
    pub agreement: AgreementRecord,
    pub coverage: CoverageReport,
}

/// In-memory pipeline over a loaded glossary
#[derive(Debug, Clone)]
pub struct ClusterPipeline {
    config: GlossaConfig,
}

impl ClusterPipeline {
    pub fn new(config: GlossaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GlossaConfig {
        &self.config
    }

    /// Build the relationship graph; unresolved references fail here in strict mode
    pub fn build_graph(&self, glossary: &Glossary, ctx: &mut RunContext) -> Result<RelationshipGraph> {
        RelationshipGraph::build(
            glossary,
            self.config.graph.edge_weighting,
            self.config.dataset.strict_references,
            ctx,
        )
    }

    pub fn partition_graph(&self, graph: &RelationshipGraph, ctx: &mut RunContext) -> Result<CommunityDetection> {
        LouvainDetector::from_config(&self.config.graph).partition(graph, ctx)
    }

    pub fn partition_semantic(&self, glossary: &Glossary, ctx: &mut RunContext) -> Result<SemanticClustering> {
        SemanticPartitioner::new(self.config.semantic.clone()).partition(glossary, ctx)
    }

    /// Run every stage; the first error stops the run
    pub fn run(&self, glossary: &Glossary, ctx: &mut RunContext) -> Result<PipelineResults> {
        self.config.validate()?;
        ctx.log_param("num_terms", glossary.len());

        let graph = self.build_graph(glossary, ctx)?;
        let graph_stats = graph.stats(ctx);

        let mut graph_ctx = ctx.fork();
        let mut semantic_ctx = ctx.fork();
        let (graph_clustering, semantic_clustering) = if self.config.pipeline.parallel_partitioners {
            rayon::join(
                || self.partition_graph(&graph, &mut graph_ctx),
                || self.partition_semantic(glossary, &mut semantic_ctx),
            )
        } else {
            (
                self.partition_graph(&graph, &mut graph_ctx),
                self.partition_semantic(glossary, &mut semantic_ctx),
            )
        };
        ctx.absorb(graph_ctx);
        ctx.absorb(semantic_ctx);
        let graph_clustering = graph_clustering?;
        let semantic_clustering = semantic_clustering?;

        let agreement = agreement::evaluate(
            &graph_clustering.partition,
            &semantic_clustering.partition,
            ctx,
        )?;

        let coverage = CoverageReport::from_glossary(glossary)?;
        ctx.log_metric("coverage_percent", coverage.coverage_percent);

        Ok(PipelineResults {
            graph,
            graph_stats,
            graph_clustering,
            semantic_clustering,
            agreement,
            coverage,
        })
    }
}

/// The `params` block every stats artifact carries
#[derive(Debug, Deserialize)]
struct StageParams {
    #[serde(default)]
    params: BTreeMap<String, serde_json::Value>,
}

/// Parameters recorded under one stage prefix
fn stage_params(ctx: &RunContext, prefix: &str) -> BTreeMap<String, serde_json::Value> {
    ctx.params()
        .iter()
        .filter(|(key, _)| key.starts_with(prefix))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Stages bound to a directory layout
#[derive(Debug, Clone)]
pub struct Workspace {
    paths: ResourcePaths,
    config: GlossaConfig,
}

impl Workspace {
    /// Bind a validated configuration to the directories it names
    pub fn new(config: GlossaConfig) -> Result<Self> {
        let paths = ResourcePaths::from_config(&config.paths);
        Self::with_paths(config, paths)
    }

    pub fn with_paths(config: GlossaConfig, paths: ResourcePaths) -> Result<Self> {
        config.validate()?;
        Ok(Self { paths, config })
    }

    pub fn paths(&self) -> &ResourcePaths {
        &self.paths
    }

    pub fn config(&self) -> &GlossaConfig {
        &self.config
    }

    fn pipeline(&self) -> ClusterPipeline {
        ClusterPipeline::new(self.config.clone())
    }

    fn history_path(&self) -> Result<PathBuf> {
        self.paths
            .resolve(&format!("output:{}", self.config.evaluation.history_file))
    }

    /// Location of the configured glossary
    pub fn glossary_path(&self) -> Result<PathBuf> {
        self.paths.resolve(&self.config.dataset.glossary)
    }

    pub fn load_glossary(&self, ctx: &mut RunContext) -> Result<Glossary> {
        let path = self.glossary_path()?;
        let glossary = Glossary::load(&path)?;
        glossary.resolve_references(self.config.dataset.strict_references)?;
        ctx.log_param("dataset.glossary", path.display().to_string());
        Ok(glossary)
    }

    /// Check a glossary file (the configured one unless `file` is given)
    pub fn validate(&self, file: Option<&Path>) -> Result<ValidationSummary> {
        let path = match file {
            Some(path) => path.to_path_buf(),
            None => self.glossary_path()?,
        };
        let summary = Glossary::validate_file(&path, self.config.dataset.strict_references)?;
        if summary.unresolved_references > 0 {
            warn!(
                "{} references point to unknown terms and will be dropped",
                summary.unresolved_references
            );
        }
        info!("Glossary {} is valid: {} terms", path.display(), summary.terms);
        Ok(summary)
    }

    fn write(&self, uri: &str, kind: &str, ctx: &mut RunContext, write: impl FnOnce(&Path) -> Result<()>) -> Result<PathBuf> {
        let path = self.paths.resolve(uri)?;
        write(&path)?;
        ctx.log_artifact(kind, &path);
        Ok(path)
    }

    fn write_graph_artifacts(
        &self,
        graph: &RelationshipGraph,
        stats: &GraphStats,
        detection: &CommunityDetection,
        coverage: &CoverageReport,
        ctx: &mut RunContext,
    ) -> Result<()> {
        let params = stage_params(ctx, "graph.");
        self.write(uris::GRAPH_PARTITION, "graph_partition", ctx, |path| {
            artifacts::write_partition_csv(path, &detection.partition)
        })?;
        self.write(uris::GRAPH_STATS, "graph_stats", ctx, |path| {
            artifacts::write_json(
                path,
                &serde_json::json!({
                    "graph": stats,
                    "communities": detection.communities.len(),
                    "modularity": detection.modularity,
                    "passes": detection.passes,
                    "params": params,
                }),
            )
        })?;
        self.write(uris::COVERAGE, "coverage_report", ctx, |path| {
            artifacts::write_json(path, coverage)
        })?;
        self.write(uris::GRAPH_DOT, "graph_dot", ctx, |path| {
            artifacts::write_text(path, &graph.to_dot(Some(&detection.partition)))
        })?;
        Ok(())
    }

    fn write_semantic_artifacts(&self, clustering: &SemanticClustering, ctx: &mut RunContext) -> Result<()> {
        self.write(uris::SEMANTIC_PARTITION, "semantic_partition", ctx, |path| {
            artifacts::write_partition_csv(path, &clustering.partition)
        })?;
        let mut stats = clustering.stats(self.config.semantic.k);
        stats.params = stage_params(ctx, "semantic.");
        self.write(uris::SEMANTIC_STATS, "semantic_stats", ctx, |path| {
            artifacts::write_json(path, &stats)
        })?;
        Ok(())
    }

    fn write_agreement(&self, record: &AgreementRecord, ctx: &mut RunContext) -> Result<()> {
        self.write(uris::AGREEMENT, "agreement", ctx, |path| artifacts::write_json(path, record))?;
        let history = self.history_path()?;
        history::append_record(&history, record)?;
        ctx.log_artifact("agreement_history", &history);
        Ok(())
    }

    /// Build the graph partition and write its artifacts
    pub fn graph_partition(&self, ctx: &mut RunContext) -> Result<CommunityDetection> {
        let glossary = self.load_glossary(ctx)?;
        let pipeline = self.pipeline();
        ctx.log_param("num_terms", glossary.len());

        let graph = pipeline.build_graph(&glossary, ctx)?;
        let stats = graph.stats(ctx);
        let detection = pipeline.partition_graph(&graph, ctx)?;
        let coverage = CoverageReport::from_glossary(&glossary)?;
        ctx.log_metric("coverage_percent", coverage.coverage_percent);

        self.write_graph_artifacts(&graph, &stats, &detection, &coverage, ctx)?;
        Ok(detection)
    }

    /// Build the semantic partition and write its artifacts
    pub fn semantic_partition(&self, ctx: &mut RunContext) -> Result<SemanticClustering> {
        let glossary = self.load_glossary(ctx)?;
        ctx.log_param("num_terms", glossary.len());

        let clustering = self.pipeline().partition_semantic(&glossary, ctx)?;
        self.write_semantic_artifacts(&clustering, ctx)?;
        Ok(clustering)
    }

    /// Score the two partition tables and append the result to the history
    pub fn evaluate(&self, ctx: &mut RunContext) -> Result<AgreementRecord> {
        let graph = artifacts::read_partition_csv(&self.paths.resolve(uris::GRAPH_PARTITION)?)?;
        let semantic = artifacts::read_partition_csv(&self.paths.resolve(uris::SEMANTIC_PARTITION)?)?;
        self.restore_stage_params(ctx)?;

        let record = agreement::evaluate(&graph, &semantic, ctx)?;
        self.write_agreement(&record, ctx)?;
        Ok(record)
    }

    /// Carry the parameters the partition stages ran with into this run
    fn restore_stage_params(&self, ctx: &mut RunContext) -> Result<()> {
        for uri in [uris::GRAPH_STATS, uris::SEMANTIC_STATS] {
            let stage: StageParams = artifacts::read_json(&self.paths.resolve(uri)?)?;
            for (key, value) in stage.params {
                ctx.log_param(key, value);
            }
        }
        Ok(())
    }

    /// Every stage in order, then the run record
    pub fn run_all(&self, ctx: &mut RunContext) -> Result<PipelineResults> {
        let glossary = self.load_glossary(ctx)?;
        let results = self.pipeline().run(&glossary, ctx)?;

        self.write_graph_artifacts(
            &results.graph,
            &results.graph_stats,
            &results.graph_clustering,
            &results.coverage,
            ctx,
        )?;
        self.write_semantic_artifacts(&results.semantic_clustering, ctx)?;
        self.write_agreement(&results.agreement, ctx)?;
        self.record_run(ctx)?;

        info!(
            "Run {} complete: ARI = {:.4}",
            ctx.run_name(),
            results.agreement.adjusted_rand_index
        );
        Ok(results)
    }

    /// Persist the run record under the runs directory
    pub fn record_run(&self, ctx: &RunContext) -> Result<PathBuf> {
        let path = artifacts::write_run_record(self.paths.runs_dir(), &ctx.run_record())?;
        info!("Run record written to {}", path.display());
        Ok(path)
    }

    /// Copy the output directory to the docs directory
    pub fn publish(&self, docs: Option<&Path>) -> Result<Vec<PathBuf>> {
        let destination = match docs {
            Some(dir) => self.paths.clone().with_docs_dir(dir).docs_dir().to_path_buf(),
            None => self.paths.docs_dir().to_path_buf(),
        };
        artifacts::publish(self.paths.output_dir(), &destination)
    }

    /// Agreement history, oldest first
    pub fn history(&self) -> Result<Vec<AgreementRecord>> {
        history::read_history(&self.history_path()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::glossary::Term;

    fn glossary() -> Glossary {
        Glossary::from_terms([
            Term::new("A", "A", "neural network training").with_references(["B"]),
            Term::new("B", "B", "neural network layers").with_references(["A"]),
            Term::new("C", "C", "probability distribution"),
            Term::new("D", "D", "probability sampling"),
        ])
        .unwrap()
    }

    fn config(parallel: bool) -> GlossaConfig {
        let mut config = GlossaConfig::default();
        config.semantic.k = 2;
        config.pipeline.parallel_partitioners = parallel;
        config
    }

    #[test]
    fn run_covers_every_term() {
        let mut ctx = RunContext::new("pipeline");
        let results = ClusterPipeline::new(config(false)).run(&glossary(), &mut ctx).unwrap();

        assert_eq!(results.graph_clustering.partition.len(), 4);
        assert_eq!(results.semantic_clustering.partition.len(), 4);
        assert_eq!(results.graph_clustering.partition.num_clusters(), 3);
        assert!(ctx.metric("adjusted_rand_index").is_some());
        assert_eq!(ctx.param("semantic.k"), Some(&serde_json::json!(2)));
        assert_eq!(ctx.param("graph.edge_weighting"), Some(&serde_json::json!("binary")));
        assert_eq!(ctx.diagnostics().isolated_terms, 2);
        assert_eq!(results.coverage.covered_terms, 2);
    }

    #[test]
    fn parallel_and_sequential_runs_agree() {
        let g = glossary();
        let mut seq_ctx = RunContext::new("seq");
        let mut par_ctx = RunContext::new("par");
        let seq = ClusterPipeline::new(config(false)).run(&g, &mut seq_ctx).unwrap();
        let par = ClusterPipeline::new(config(true)).run(&g, &mut par_ctx).unwrap();

        assert_eq!(seq.graph_clustering.partition, par.graph_clustering.partition);
        assert_eq!(seq.semantic_clustering.partition, par.semantic_clustering.partition);
        assert_eq!(seq.agreement.adjusted_rand_index, par.agreement.adjusted_rand_index);
        assert_eq!(seq_ctx.metrics(), par_ctx.metrics());
    }

    #[test]
    fn strict_references_stop_before_clustering() {
        let mut config = config(false);
        config.dataset.strict_references = true;
        let g = Glossary::from_terms([Term::new("A", "A", "x").with_references(["ghost"])]).unwrap();
        let mut ctx = RunContext::new("strict");

        let err = ClusterPipeline::new(config).run(&g, &mut ctx).unwrap_err();
        assert!(err.is_input_error());
        assert!(ctx.metric("graph.modularity").is_none());
        assert!(ctx.metric("semantic.inertia").is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = config(false);
        config.semantic.k = 0;
        let mut ctx = RunContext::new("bad");
        assert!(ClusterPipeline::new(config).run(&glossary(), &mut ctx).is_err());
    }
}
