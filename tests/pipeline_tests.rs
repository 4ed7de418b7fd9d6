//! End-to-end tests for the staged workspace over a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use glossa_rs::core::pipeline::uris;
use glossa_rs::io::artifacts;
use glossa_rs::{GlossaConfig, GlossaError, RunContext, Workspace};
use tempfile::TempDir;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample_glossary.json");

fn workspace() -> (TempDir, Workspace) {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::copy(FIXTURE, data.join("aiml_glossary.json")).unwrap();

    let mut config = GlossaConfig::default();
    config.paths.root = dir.path().to_path_buf();
    config.semantic.k = 3;
    config.semantic.n_init = 5;
    (dir, Workspace::new(config).unwrap())
}

fn output(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join("output").join(name)
}

fn json_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
                .count()
        })
        .unwrap_or(0)
}

#[test]
fn run_all_writes_every_artifact() {
    let (dir, workspace) = workspace();
    let mut ctx = RunContext::new("e2e");

    let results = workspace.run_all(&mut ctx).unwrap();

    for name in [
        "cluster_assignments.csv",
        "semantic_clusters.csv",
        "graph_stats.json",
        "semantic_stats.json",
        "ari_metrics.json",
        "coverage_report.json",
        "ari_history.jsonl",
    ] {
        assert!(output(&dir, name).is_file(), "missing {name}");
    }
    assert!(dir.path().join("visualizations/glossary_graph.dot").is_file());
    assert_eq!(json_files(&dir.path().join("experiments/runs")), 1);

    assert_eq!(results.graph_clustering.partition.len(), 12);
    assert_eq!(results.semantic_clustering.partition.len(), 12);
    assert!((-1.0..=1.0).contains(&results.agreement.adjusted_rand_index));
    assert_eq!(results.agreement.num_terms, 12);
    assert_eq!(ctx.diagnostics().unresolved_references, 1);
}

#[test]
fn staged_commands_match_the_single_run() {
    let (_dir, workspace) = workspace();

    let mut ctx = RunContext::new("graph");
    let detection = workspace.graph_partition(&mut ctx).unwrap();
    let mut ctx = RunContext::new("semantic");
    let clustering = workspace.semantic_partition(&mut ctx).unwrap();
    let mut ctx = RunContext::new("evaluate");
    let staged = workspace.evaluate(&mut ctx).unwrap();

    let graph_table = artifacts::read_partition_csv(&workspace.paths().resolve(uris::GRAPH_PARTITION).unwrap()).unwrap();
    assert!(graph_table.same_grouping(&detection.partition));
    let semantic_table =
        artifacts::read_partition_csv(&workspace.paths().resolve(uris::SEMANTIC_PARTITION).unwrap()).unwrap();
    assert!(semantic_table.same_grouping(&clustering.partition));

    let mut ctx = RunContext::new("all");
    let results = workspace.run_all(&mut ctx).unwrap();
    assert_eq!(staged.adjusted_rand_index, results.agreement.adjusted_rand_index);
}

#[test]
fn evaluate_without_partitions_is_an_input_error() {
    let (_dir, workspace) = workspace();
    let mut ctx = RunContext::new("early");

    let err = workspace.evaluate(&mut ctx).unwrap_err();
    assert!(err.is_input_error());
    assert!(err.to_string().contains("cluster_assignments.csv"));
}

#[test]
fn history_grows_by_one_record_per_evaluation() {
    let (_dir, workspace) = workspace();
    assert!(workspace.history().unwrap().is_empty());

    for name in ["first", "second"] {
        let mut ctx = RunContext::new(name);
        workspace.run_all(&mut ctx).unwrap();
    }

    let history = workspace.history().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].run_name, "first");
    assert_eq!(history[1].run_name, "second");
    assert_eq!(history[0].adjusted_rand_index, history[1].adjusted_rand_index);
}

#[test]
fn strict_references_stop_the_run() {
    let (dir, mut workspace) = workspace();
    let mut config = workspace.config().clone();
    config.dataset.strict_references = true;
    workspace = Workspace::new(config).unwrap();

    let mut ctx = RunContext::new("strict");
    let err = workspace.run_all(&mut ctx).unwrap_err();
    assert!(matches!(err, GlossaError::Input { .. }));
    assert!(!output(&dir, "ari_history.jsonl").exists());
}

#[test]
fn strict_references_stop_the_semantic_stage() {
    let (dir, workspace) = workspace();
    let mut config = workspace.config().clone();
    config.dataset.strict_references = true;
    let workspace = Workspace::new(config).unwrap();

    let mut ctx = RunContext::new("strict-semantic");
    let err = workspace.semantic_partition(&mut ctx).unwrap_err();
    assert!(err.is_input_error());
    assert!(err.to_string().contains("unknown_term"));
    assert!(!output(&dir, "semantic_clusters.csv").exists());
    assert!(ctx.metric("semantic.inertia").is_none());
}

#[test]
fn staged_evaluation_records_stage_parameters() {
    let (_dir, workspace) = workspace();

    let mut ctx = RunContext::new("graph");
    workspace.graph_partition(&mut ctx).unwrap();

    let mut semantic_config = workspace.config().clone();
    semantic_config.semantic.k = 2;
    semantic_config.semantic.seed = 99;
    let semantic_workspace = Workspace::new(semantic_config).unwrap();
    let mut ctx = RunContext::new("semantic");
    semantic_workspace.semantic_partition(&mut ctx).unwrap();

    let mut ctx = RunContext::new("evaluate");
    let record = workspace.evaluate(&mut ctx).unwrap();

    for key in [
        "graph.seed",
        "graph.resolution",
        "graph.edge_weighting",
        "semantic.k",
        "semantic.seed",
        "semantic.n_init",
        "num_terms",
    ] {
        assert!(record.params.contains_key(key), "missing {key}");
    }
    assert_eq!(record.params["semantic.k"], serde_json::json!(2));
    assert_eq!(record.params["semantic.seed"], serde_json::json!(99));
    assert_eq!(record.params["graph.edge_weighting"], serde_json::json!("binary"));
    assert_eq!(ctx.param("semantic.k"), Some(&serde_json::json!(2)));

    let history = workspace.history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].params, record.params);
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let mut config = GlossaConfig::default();
    config.semantic.k = 0;
    let err = Workspace::new(config).unwrap_err();
    assert!(matches!(err, GlossaError::Config { .. }));

    let mut config = GlossaConfig::default();
    config.graph.resolution = 0.0;
    assert!(Workspace::new(config).is_err());
}

#[test]
fn publish_copies_the_output_tree() {
    let (dir, workspace) = workspace();
    let mut ctx = RunContext::new("publish");
    workspace.run_all(&mut ctx).unwrap();

    let published = workspace.publish(None).unwrap();
    assert!(published.iter().any(|path| path.ends_with("ari_metrics.json")));
    assert!(dir.path().join("docs/cluster_assignments.csv").is_file());
}

#[test]
fn validate_reports_without_writing() {
    let (dir, workspace) = workspace();
    let summary = workspace.validate(None).unwrap();

    assert_eq!(summary.terms, 12);
    assert_eq!(summary.unresolved_references, 1);
    assert!(!dir.path().join("output").exists());
}
