//! Configuration types and management for glossa-rs.
//!
//! A single YAML document drives a run: where the glossary lives, how the
//! relationship graph is weighted and partitioned, how definitions are
//! vectorized and clustered, and where artifacts land.

pub mod clustering;
pub mod validation;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{GlossaError, Result, ResultExt};

pub use clustering::{EdgeWeighting, GraphConfig, SemanticConfig};
pub use validation::{
    validate_non_empty, validate_non_negative, validate_positive_f64, validate_positive_usize,
};

/// Main configuration for a clustering run
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GlossaConfig {
    /// Input dataset settings
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Relationship graph and community detection
    #[serde(default)]
    pub graph: GraphConfig,

    /// Definition vectorization and k-means
    #[serde(default)]
    pub semantic: SemanticConfig,

    /// Agreement evaluation and history
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Filesystem layout for logical resources
    #[serde(default)]
    pub paths: PathsConfig,

    /// Stage execution settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Input dataset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Logical URI of the glossary file (e.g. `data:aiml_glossary.json`)
    #[serde(default = "default_glossary_uri")]
    pub glossary: String,

    /// Treat references to unknown terms as fatal input errors
    #[serde(default)]
    pub strict_references: bool,
}

/// Agreement evaluation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// File name of the append-only agreement history inside the output directory
    #[serde(default = "default_history_file")]
    pub history_file: String,

    /// Human-readable run name recorded with each run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,
}

/// Directory layout, relative to `root` unless absolute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Repository root all relative directories hang off
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Input datasets (`data:` prefix)
    #[serde(default = "default_data_dir")]
    pub data: PathBuf,

    /// Generated artifacts (`output:` prefix)
    #[serde(default = "default_output_dir")]
    pub output: PathBuf,

    /// Graph exports (`visualizations:` prefix)
    #[serde(default = "default_visualizations_dir")]
    pub visualizations: PathBuf,

    /// Per-run records (`runs:` prefix)
    #[serde(default = "default_runs_dir")]
    pub runs: PathBuf,

    /// Publish destination (`docs:` prefix)
    #[serde(default = "default_docs_dir")]
    pub docs: PathBuf,
}

/// Stage execution settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Run the graph and semantic partitioners on separate threads
    #[serde(default)]
    pub parallel_partitioners: bool,
}

fn default_glossary_uri() -> String {
    "data:aiml_glossary.json".to_string()
}

fn default_history_file() -> String {
    "ari_history.jsonl".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_visualizations_dir() -> PathBuf {
    PathBuf::from("visualizations")
}

fn default_runs_dir() -> PathBuf {
    PathBuf::from("experiments/runs")
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            glossary: default_glossary_uri(),
            strict_references: false,
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            run_name: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            data: default_data_dir(),
            output: default_output_dir(),
            visualizations: default_visualizations_dir(),
            runs: default_runs_dir(),
            docs: default_docs_dir(),
        }
    }
}

impl DatasetConfig {
    /// Validate dataset settings
    pub fn validate(&self) -> Result<()> {
        validate_non_empty(&self.glossary, "dataset.glossary")
    }
}

impl EvaluationConfig {
    /// Validate evaluation settings
    pub fn validate(&self) -> Result<()> {
        validate_non_empty(&self.history_file, "evaluation.history_file")?;
        if self.history_file.contains(['/', '\\']) {
            return Err(GlossaError::config_field(
                "history_file must be a bare file name inside the output directory",
                "evaluation.history_file",
            ));
        }
        Ok(())
    }
}

impl GlossaConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(Into::into)
    }

    /// Render configuration as YAML
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = self.to_yaml_string()?;
        std::fs::write(&path, content).map_err(|e| GlossaError::artifact_write(&path, e))
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.dataset.validate()?;
        self.graph.validate()?;
        self.semantic.validate()?;
        self.evaluation.validate()?;
        Ok(())
    }
}
