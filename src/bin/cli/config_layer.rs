//! Configuration Layer Management
//!
//! Builds the effective configuration from defaults, an optional YAML file,
//! environment variables and CLI flags, in that order of increasing priority.

use std::path::{Path, PathBuf};

use anyhow::Context;
use glossa_rs::GlossaConfig;

use crate::cli::args::{Cli, ClusterArgs};

/// File names looked up under the root when `--config` is not given
const IMPLICIT_CONFIG_FILES: [&str; 2] = [".glossa.yml", ".glossa.yaml"];

/// Trait for merging configuration layers
pub trait ConfigMerge<T> {
    /// Merge another layer into this one, with the other taking priority
    fn merge_with(&mut self, other: T);
}

impl ConfigMerge<&ClusterArgs> for GlossaConfig {
    fn merge_with(&mut self, args: &ClusterArgs) {
        if let Some(k) = args.k {
            self.semantic.k = k;
        }
        if let Some(seed) = args.seed {
            self.semantic.seed = seed;
            self.graph.seed = seed;
        }
        if let Some(weighting) = args.edge_weighting {
            self.graph.edge_weighting = weighting.into();
        }
        if let Some(resolution) = args.resolution {
            self.graph.resolution = resolution;
        }
        if args.strict {
            self.dataset.strict_references = true;
        }
    }
}

fn implicit_config(root: &Path) -> Option<PathBuf> {
    IMPLICIT_CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Effective configuration for a command
pub fn load_layered_config(cli: &Cli, overrides: Option<&ClusterArgs>) -> anyhow::Result<GlossaConfig> {
    let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));

    let file = cli.config.clone().or_else(|| implicit_config(&root));
    let mut config = match &file {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            GlossaConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => GlossaConfig::default(),
    };

    if cli.root.is_some() {
        config.paths.root = root;
    }
    if let Some(name) = &cli.run_name {
        config.evaluation.run_name = Some(name.clone());
    }
    if let Some(args) = overrides {
        config.merge_with(args);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
