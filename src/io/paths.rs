//! Logical resource names to filesystem locations.
//!
//! Stages name their inputs and outputs as `data:aiml_glossary.json`,
//! `output:cluster_assignments.csv` and so on; a [`ResourcePaths`] built from
//! configuration turns those into paths. Nothing else in the crate joins
//! directory strings.

use std::path::{Path, PathBuf};

use crate::core::config::PathsConfig;
use crate::core::errors::{GlossaError, Result};

/// Directory each logical prefix maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePaths {
    root: PathBuf,
    data: PathBuf,
    output: PathBuf,
    visualizations: PathBuf,
    runs: PathBuf,
    docs: PathBuf,
}

impl ResourcePaths {
    /// Resolve every configured directory against the configured root
    pub fn from_config(config: &PathsConfig) -> Self {
        Self::with_root(&config.root, config)
    }

    /// Resolve configured directories against an explicit root
    pub fn with_root(root: impl AsRef<Path>, config: &PathsConfig) -> Self {
        let root = root.as_ref().to_path_buf();
        let under_root = |dir: &Path| {
            if dir.is_absolute() {
                dir.to_path_buf()
            } else {
                root.join(dir)
            }
        };

        Self {
            data: under_root(&config.data),
            output: under_root(&config.output),
            visualizations: under_root(&config.visualizations),
            runs: under_root(&config.runs),
            docs: under_root(&config.docs),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> &Path {
        &self.data
    }

    pub fn output_dir(&self) -> &Path {
        &self.output
    }

    pub fn visualizations_dir(&self) -> &Path {
        &self.visualizations
    }

    pub fn runs_dir(&self) -> &Path {
        &self.runs
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs
    }

    /// Replace the publish destination
    pub fn with_docs_dir(mut self, docs: impl AsRef<Path>) -> Self {
        let docs = docs.as_ref();
        self.docs = if docs.is_absolute() {
            docs.to_path_buf()
        } else {
            self.root.join(docs)
        };
        self
    }

    /// Map a logical URI to a path.
    ///
    /// `prefix:name` resolves inside the prefix's directory; a string without
    /// a prefix is taken relative to the root (or as-is when absolute).
    pub fn resolve(&self, uri: &str) -> Result<PathBuf> {
        let Some((prefix, name)) = uri.split_once(':') else {
            let path = Path::new(uri);
            return Ok(if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.root.join(path)
            });
        };

        if name.is_empty() {
            return Err(GlossaError::config(format!("resource URI '{uri}' names no file")));
        }

        let dir = match prefix {
            "data" => &self.data,
            "output" => &self.output,
            "visualizations" => &self.visualizations,
            "runs" => &self.runs,
            "docs" => &self.docs,
            other => {
                return Err(GlossaError::config(format!(
                    "unknown resource prefix '{other}' in '{uri}'"
                )))
            }
        };
        Ok(dir.join(name))
    }
}

impl Default for ResourcePaths {
    fn default() -> Self {
        Self::from_config(&PathsConfig::default())
    }
}
