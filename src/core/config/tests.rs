use super::*;
use crate::core::errors::GlossaError;

fn expect_config_error<T: std::fmt::Debug>(result: Result<T>) -> GlossaError {
    result.expect_err("expected validation failure")
}

#[test]
fn default_config_validates() {
    GlossaConfig::default().validate().expect("default config");
}

#[test]
fn semantic_k_must_be_positive() {
    let mut config = GlossaConfig::default();
    config.semantic.k = 0;
    let err = expect_config_error(config.validate());
    assert!(matches!(err, GlossaError::Config { .. }));
    assert!(format!("{err}").contains("semantic.k"));
}

#[test]
fn graph_resolution_must_be_positive() {
    let mut config = GlossaConfig::default();
    config.graph.resolution = 0.0;
    let err = expect_config_error(config.validate());
    assert!(format!("{err}").contains("graph.resolution"));
}

#[test]
fn history_file_must_be_bare_name() {
    let mut config = GlossaConfig::default();
    config.evaluation.history_file = "../elsewhere/history.jsonl".to_string();
    let err = expect_config_error(config.validate());
    assert!(format!("{err}").contains("history_file"));
}

#[test]
fn partial_yaml_fills_defaults() {
    let yaml = r#"
semantic:
  k: 4
graph:
  edge_weighting: reference_count
"#;
    let config = GlossaConfig::from_yaml_str(yaml).expect("parse");
    assert_eq!(config.semantic.k, 4);
    assert_eq!(config.semantic.seed, 42);
    assert_eq!(config.graph.edge_weighting, EdgeWeighting::ReferenceCount);
    assert_eq!(config.dataset.glossary, "data:aiml_glossary.json");
    assert_eq!(config.evaluation.history_file, "ari_history.jsonl");
}

#[test]
fn yaml_round_trip_preserves_settings() {
    let mut config = GlossaConfig::default();
    config.semantic.k = 5;
    config.graph.seed = 7;
    config.evaluation.run_name = Some("nightly".to_string());

    let yaml = config.to_yaml_string().expect("serialize");
    let parsed = GlossaConfig::from_yaml_str(&yaml).expect("parse");
    assert_eq!(parsed.semantic.k, 5);
    assert_eq!(parsed.graph.seed, 7);
    assert_eq!(parsed.evaluation.run_name.as_deref(), Some("nightly"));
}

#[test]
fn unknown_edge_weighting_is_rejected() {
    let yaml = "graph:\n  edge_weighting: cosine\n";
    let err = expect_config_error(GlossaConfig::from_yaml_str(yaml));
    assert!(matches!(err, GlossaError::Serialization { .. }));
}

#[test]
fn from_yaml_file_reports_missing_file() {
    let err = expect_config_error(GlossaConfig::from_yaml_file("/nonexistent/.glossa.yml"));
    match err {
        GlossaError::Io { message, .. } => {
            assert!(message.starts_with("Failed to read config file /nonexistent/.glossa.yml"));
        }
        other => panic!("expected Io error, got {other:?}"),
    }
}
