//! Run context: the explicit record of one pipeline invocation.
//!
//! Every stage receives `&mut RunContext` and logs its parameters, metrics,
//! artifacts and degenerate-input counts here. Nothing is process-global, so a
//! stage can be exercised in isolation with a fresh context and no storage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counts of non-fatal degenerate input seen during a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// References naming a term absent from the glossary (dropped)
    pub unresolved_references: usize,
    /// References from a term to itself (ignored)
    pub self_references: usize,
    /// Repeated references within a single term (collapsed)
    pub duplicate_references: usize,
    /// Terms with missing or blank definition text
    pub empty_definitions: usize,
    /// Terms with no resolved relation in either direction
    pub isolated_terms: usize,
}

impl Diagnostics {
    /// Whether any degenerate input was observed
    pub fn has_warnings(&self) -> bool {
        self.unresolved_references > 0
            || self.self_references > 0
            || self.duplicate_references > 0
            || self.empty_definitions > 0
            || self.isolated_terms > 0
    }
}

/// An artifact written during the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Logical artifact kind (e.g. `graph_partition`)
    pub kind: String,
    /// Location on disk
    pub path: PathBuf,
}

/// Serializable snapshot of a run, persisted as the run record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub run_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub params: BTreeMap<String, serde_json::Value>,
    pub metrics: BTreeMap<String, f64>,
    pub artifacts: Vec<ArtifactRecord>,
    pub diagnostics: Diagnostics,
}

/// Mutable state carried through the stages of one run
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: Uuid,
    run_name: String,
    started_at: DateTime<Utc>,
    params: BTreeMap<String, serde_json::Value>,
    metrics: BTreeMap<String, f64>,
    artifacts: Vec<ArtifactRecord>,
    diagnostics: Diagnostics,
}

impl RunContext {
    /// Start a new run with a fresh identifier
    pub fn new(run_name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), run_name, Utc::now())
    }

    /// Start a new run, naming it after its id unless a name is given
    pub fn start(run_name: Option<String>) -> Self {
        let run_id = Uuid::new_v4();
        let run_name = run_name.unwrap_or_else(|| Self::default_run_name(&run_id));
        Self::with_id(run_id, run_name, Utc::now())
    }

    /// Start a run with a fixed identifier and start time
    pub fn with_id(run_id: Uuid, run_name: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            run_name: run_name.into(),
            started_at,
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
            artifacts: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Default run name: `glossa-<first 8 hex digits of the id>`
    pub fn default_run_name(run_id: &Uuid) -> String {
        let simple = run_id.simple().to_string();
        format!("glossa-{}", &simple[..8])
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Record a run parameter; a later value for the same key replaces the earlier one
    pub fn log_param(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.params.insert(key.into(), value.into());
    }

    /// Record a metric; a later value for the same key replaces the earlier one
    pub fn log_metric(&mut self, key: impl Into<String>, value: f64) {
        self.metrics.insert(key.into(), value);
    }

    /// Record an artifact written by a stage
    pub fn log_artifact(&mut self, kind: impl Into<String>, path: impl AsRef<Path>) {
        self.artifacts.push(ArtifactRecord {
            kind: kind.into(),
            path: path.as_ref().to_path_buf(),
        });
    }

    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }

    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }

    pub fn params(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.params
    }

    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    pub fn artifacts(&self) -> &[ArtifactRecord] {
        &self.artifacts
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Record terms with missing or blank definitions
    pub fn record_empty_definitions(&mut self, count: usize) {
        self.diagnostics.empty_definitions = count;
    }

    /// Record dropped references found while building the graph
    pub fn record_reference_issues(&mut self, unresolved: usize, self_refs: usize, duplicates: usize) {
        self.diagnostics.unresolved_references = unresolved;
        self.diagnostics.self_references = self_refs;
        self.diagnostics.duplicate_references = duplicates;
    }

    pub fn record_isolated_terms(&mut self, count: usize) {
        self.diagnostics.isolated_terms = count;
    }

    /// Empty context for the same run, for a stage running on another thread
    pub fn fork(&self) -> Self {
        Self::with_id(self.run_id, self.run_name.clone(), self.started_at)
    }

    /// Fold a forked context back in; diagnostic counts are added
    pub fn absorb(&mut self, child: RunContext) {
        self.params.extend(child.params);
        self.metrics.extend(child.metrics);
        self.artifacts.extend(child.artifacts);

        let d = child.diagnostics;
        self.diagnostics.unresolved_references += d.unresolved_references;
        self.diagnostics.self_references += d.self_references;
        self.diagnostics.duplicate_references += d.duplicate_references;
        self.diagnostics.empty_definitions += d.empty_definitions;
        self.diagnostics.isolated_terms += d.isolated_terms;
    }

    /// Snapshot the run for persistence
    pub fn run_record(&self) -> RunRecord {
        RunRecord {
            run_id: self.run_id,
            run_name: self.run_name.clone(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            params: self.params.clone(),
            metrics: self.metrics.clone(),
            artifacts: self.artifacts.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}
