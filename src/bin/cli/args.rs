//! CLI Argument Structures
//!
//! Argument definitions, subcommands and value enums for the `glossa` binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use glossa_rs::EdgeWeighting;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Glossary clustering and agreement tracking
#[derive(Parser)]
#[command(name = "glossa")]
#[command(version = VERSION)]
#[command(about = "Cluster a glossary by its references and by its definitions, then compare the two")]
#[command(long_about = "
Partition glossary terms two ways (reference-graph communities and
definition-similarity clusters) and track how well they agree across runs.

Common Usage:

  # Check the dataset before clustering
  glossa validate data/aiml_glossary.json

  # Run every stage and append the agreement score to the history
  glossa run

  # Run stages one by one
  glossa graph
  glossa semantic --k 6
  glossa evaluate

  # Show the agreement trend
  glossa history
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to .glossa.yml under the root when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory the data/output/docs layout hangs off
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Name recorded with the run
    #[arg(long, global = true, env = "RUN_NAME")]
    pub run_name: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a glossary file without clustering
    Validate(ValidateArgs),

    /// Build the reference graph partition
    Graph(ClusterArgs),

    /// Build the definition-similarity partition
    Semantic(ClusterArgs),

    /// Compare the two partitions and append the score to the history
    Evaluate,

    /// Run every stage in order
    Run(RunArgs),

    /// Copy generated artifacts to the docs directory
    Publish(PublishArgs),

    /// Show the agreement score trend across runs
    History(HistoryArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Edge weighting policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EdgeWeightingArg {
    /// Weight 1 for any related pair
    Binary,
    /// One unit per distinct directed reference
    ReferenceCount,
}

impl From<EdgeWeightingArg> for EdgeWeighting {
    fn from(arg: EdgeWeightingArg) -> Self {
        match arg {
            EdgeWeightingArg::Binary => EdgeWeighting::Binary,
            EdgeWeightingArg::ReferenceCount => EdgeWeighting::ReferenceCount,
        }
    }
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Glossary file (defaults to the configured dataset)
    pub file: Option<PathBuf>,

    /// Treat references to unknown terms as errors
    #[arg(long)]
    pub strict: bool,
}

/// Overrides shared by the clustering stages
#[derive(Args, Debug, Clone, Default)]
pub struct ClusterArgs {
    /// Number of semantic clusters
    #[arg(short, long, env = "RUN_K")]
    pub k: Option<usize>,

    /// Seed for both partitioners
    #[arg(long, env = "RUN_SEED")]
    pub seed: Option<u64>,

    /// Edge weighting policy for the reference graph
    #[arg(long, value_enum)]
    pub edge_weighting: Option<EdgeWeightingArg>,

    /// Louvain resolution (higher = more communities)
    #[arg(long)]
    pub resolution: Option<f64>,

    /// Treat references to unknown terms as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Run the two partitioners on separate threads
    #[arg(long)]
    pub parallel: bool,

    /// Copy artifacts to the docs directory afterwards
    #[arg(long)]
    pub publish: bool,
}

#[derive(Args)]
pub struct PublishArgs {
    /// Destination directory (defaults to the configured docs directory)
    #[arg(long)]
    pub docs: Option<PathBuf>,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Show only the most recent N runs
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print the records as JSON lines instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".glossa.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}
