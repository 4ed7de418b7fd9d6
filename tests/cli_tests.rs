//! Integration tests for the glossa CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, TempDir};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample_glossary.json");

/// Test helper to get the CLI binary
fn glossa_cmd() -> Command {
    let mut cmd = Command::cargo_bin("glossa").unwrap();
    cmd.env_remove("RUN_K").env_remove("RUN_SEED").env_remove("RUN_NAME");
    cmd
}

/// Root directory holding the sample glossary at its default location
fn project() -> TempDir {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::copy(FIXTURE, dir.path().join("data/aiml_glossary.json")).unwrap();
    dir
}

#[test]
fn test_help_lists_subcommands() {
    glossa_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("semantic"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn test_validate_sample_glossary() {
    glossa_cmd()
        .args(["validate", FIXTURE])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn test_validate_strict_fails_on_unknown_reference() {
    glossa_cmd()
        .args(["validate", "--strict", FIXTURE])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown_term"));
}

#[test]
fn test_validate_rejects_malformed_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    glossa_cmd().arg("validate").arg(&path).assert().failure();
}

#[test]
fn test_run_then_history() {
    let dir = project();

    glossa_cmd()
        .arg("--root")
        .arg(dir.path())
        .args(["--run-name", "cli-run", "run", "--k", "3", "--seed", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Adjusted Rand Index"));

    assert!(dir.path().join("output/ari_metrics.json").is_file());
    assert!(dir.path().join("output/ari_history.jsonl").is_file());

    glossa_cmd()
        .arg("--root")
        .arg(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("cli-run"));
}

#[test]
fn test_staged_commands() {
    let dir = project();

    for stage in [vec!["graph"], vec!["semantic", "--k", "3"], vec!["evaluate"]] {
        glossa_cmd().arg("--root").arg(dir.path()).args(&stage).assert().success();
    }

    let history = fs::read_to_string(dir.path().join("output/ari_history.jsonl")).unwrap();
    assert_eq!(history.lines().count(), 1);
}

#[test]
fn test_evaluate_before_partitions_fails() {
    let dir = project();

    glossa_cmd()
        .arg("--root")
        .arg(dir.path())
        .arg("evaluate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cluster_assignments.csv"));
}

#[test]
fn test_semantic_strict_fails_before_writing() {
    let dir = project();

    glossa_cmd()
        .arg("--root")
        .arg(dir.path())
        .args(["semantic", "--strict", "--k", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown_term"));

    assert!(!dir.path().join("output/semantic_clusters.csv").exists());
}

#[test]
fn test_invalid_k_is_rejected() {
    let dir = project();

    glossa_cmd()
        .arg("--root")
        .arg(dir.path())
        .args(["graph", "--k", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("semantic.k"));

    assert!(!dir.path().join("output/cluster_assignments.csv").exists());
}

#[test]
fn test_history_json_lines() {
    let dir = project();
    glossa_cmd()
        .arg("--root")
        .arg(dir.path())
        .args(["run", "--k", "3"])
        .assert()
        .success();

    let output = glossa_cmd()
        .arg("--root")
        .arg(dir.path())
        .args(["history", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let record: serde_json::Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(record["num_terms"], 12);
}

#[test]
fn test_empty_history() {
    let dir = project();
    glossa_cmd()
        .arg("--root")
        .arg(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No agreement history yet"));
}

#[test]
fn test_print_default_config() {
    glossa_cmd()
        .arg("print-default-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("edge_weighting"))
        .stdout(predicate::str::contains("semantic"));
}

#[test]
fn test_init_config_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let config = dir.path().join(".glossa.yml");

    glossa_cmd()
        .args(["init-config", "--output"])
        .arg(&config)
        .assert()
        .success();
    assert!(config.is_file());

    glossa_cmd()
        .args(["init-config", "--output"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    glossa_cmd()
        .args(["init-config", "--force", "--output"])
        .arg(&config)
        .assert()
        .success();
}

#[test]
fn test_config_file_is_applied() {
    let dir = project();
    let config = dir.path().join("custom.yml");
    fs::write(&config, "semantic:\n  k: 2\n").unwrap();

    glossa_cmd()
        .arg("--root")
        .arg(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("semantic")
        .assert()
        .success();

    let stats: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("output/semantic_stats.json")).unwrap()).unwrap();
    assert_eq!(stats["k_effective"], 2);
}

#[test]
fn test_invalid_config_fails() {
    let dir = project();
    let config = dir.path().join("bad.yml");
    fs::write(&config, "semantic:\n  k: 0\n").unwrap();

    glossa_cmd()
        .arg("--root")
        .arg(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("run")
        .assert()
        .failure();
}
