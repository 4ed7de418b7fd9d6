//! glossa CLI - glossary clustering and agreement tracking
//!
//! Runs the graph and semantic partitioners over a glossary, scores their
//! agreement and keeps the score history.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands, LogFormat};

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match cli.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match &cli.command {
        Commands::Validate(args) => cli::validate_command(&cli, args)?,
        Commands::Graph(args) => cli::graph_command(&cli, args)?,
        Commands::Semantic(args) => cli::semantic_command(&cli, args)?,
        Commands::Evaluate => cli::evaluate_command(&cli)?,
        Commands::Run(args) => cli::run_command(&cli, args)?,
        Commands::Publish(args) => cli::publish_command(&cli, args)?,
        Commands::History(args) => cli::history_command(&cli, args)?,
        Commands::PrintDefaultConfig => cli::print_default_config()?,
        Commands::InitConfig(args) => cli::init_config(args)?,
    }

    Ok(())
}
