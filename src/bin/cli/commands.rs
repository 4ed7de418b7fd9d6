//! Command implementations for the `glossa` binary.

use anyhow::Context;
use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use glossa_rs::io::reports::TrendSummary;
use glossa_rs::{GlossaConfig, RunContext, Workspace};

use crate::cli::args::{Cli, ClusterArgs, HistoryArgs, InitConfigArgs, PublishArgs, RunArgs, ValidateArgs};
use crate::cli::config_layer::load_layered_config;
use crate::cli::output;

fn start_run(config: &GlossaConfig) -> RunContext {
    let ctx = RunContext::start(config.evaluation.run_name.clone());
    tracing::debug!("Started run {} ({})", ctx.run_name(), ctx.run_id());
    ctx
}

/// Check a glossary file without clustering it
pub fn validate_command(cli: &Cli, args: &ValidateArgs) -> anyhow::Result<()> {
    let mut config = load_layered_config(cli, None)?;
    if args.strict {
        config.dataset.strict_references = true;
    }
    let workspace = Workspace::new(config)?;

    let path = match &args.file {
        Some(file) => file.clone(),
        None => workspace.glossary_path()?,
    };
    let summary = workspace
        .validate(Some(&path))
        .with_context(|| format!("Glossary {} failed validation", path.display()))?;

    output::print_validation(&path.display().to_string(), &summary);
    Ok(())
}

/// Reference-graph stage
pub fn graph_command(cli: &Cli, args: &ClusterArgs) -> anyhow::Result<()> {
    let config = load_layered_config(cli, Some(args))?;
    let mut ctx = start_run(&config);
    let workspace = Workspace::new(config)?;

    let detection = workspace.graph_partition(&mut ctx)?;
    workspace.record_run(&ctx)?;

    output::print_graph_partition(&detection);
    output::print_diagnostics(ctx.diagnostics());
    output::print_run_footer(&ctx);
    Ok(())
}

/// Definition-similarity stage
pub fn semantic_command(cli: &Cli, args: &ClusterArgs) -> anyhow::Result<()> {
    let config = load_layered_config(cli, Some(args))?;
    let mut ctx = start_run(&config);
    let workspace = Workspace::new(config)?;

    let clustering = workspace.semantic_partition(&mut ctx)?;
    workspace.record_run(&ctx)?;

    output::print_semantic_partition(&clustering);
    output::print_diagnostics(ctx.diagnostics());
    output::print_run_footer(&ctx);
    Ok(())
}

/// Agreement stage over the partition tables already on disk
pub fn evaluate_command(cli: &Cli) -> anyhow::Result<()> {
    let config = load_layered_config(cli, None)?;
    let mut ctx = start_run(&config);
    let workspace = Workspace::new(config)?;

    let record = workspace
        .evaluate(&mut ctx)
        .context("Run `glossa graph` and `glossa semantic` before evaluating")?;
    workspace.record_run(&ctx)?;

    output::print_agreement(&record);
    output::print_run_footer(&ctx);
    Ok(())
}

/// Every stage in order
pub fn run_command(cli: &Cli, args: &RunArgs) -> anyhow::Result<()> {
    let mut config = load_layered_config(cli, Some(&args.cluster))?;
    if args.parallel {
        config.pipeline.parallel_partitioners = true;
    }
    let mut ctx = start_run(&config);
    let workspace = Workspace::new(config)?;

    let results = workspace.run_all(&mut ctx)?;

    output::print_graph_partition(&results.graph_clustering);
    output::print_semantic_partition(&results.semantic_clustering);
    output::print_agreement(&results.agreement);
    output::print_diagnostics(ctx.diagnostics());
    output::print_run_footer(&ctx);

    if args.publish {
        let published = workspace.publish(None)?;
        output::success(&format!(
            "Published {} files to {}",
            published.len(),
            workspace.paths().docs_dir().display()
        ));
    }
    Ok(())
}

/// Copy artifacts to the docs directory
pub fn publish_command(cli: &Cli, args: &PublishArgs) -> anyhow::Result<()> {
    let config = load_layered_config(cli, None)?;
    let workspace = Workspace::new(config)?;

    let published = workspace.publish(args.docs.as_deref())?;
    let destination = match &args.docs {
        Some(dir) => workspace.paths().clone().with_docs_dir(dir).docs_dir().to_path_buf(),
        None => workspace.paths().docs_dir().to_path_buf(),
    };
    output::success(&format!(
        "Published {} files to {}",
        published.len(),
        destination.display()
    ));
    for path in &published {
        println!("  {}", path.display().dimmed());
    }
    Ok(())
}

/// Agreement trend across recorded runs
pub fn history_command(cli: &Cli, args: &HistoryArgs) -> anyhow::Result<()> {
    let config = load_layered_config(cli, None)?;
    let workspace = Workspace::new(config)?;

    let mut records = workspace.history()?;
    if let Some(limit) = args.limit {
        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
    }

    if args.json {
        for record in &records {
            println!("{}", serde_json::to_string(record)?);
        }
        return Ok(());
    }

    let trend = TrendSummary::from_history(&records);
    output::print_history(&records, trend.as_ref());
    Ok(())
}

/// Print default configuration in YAML format
pub fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default glossa configuration".dimmed());
    println!("{}", "# Save this to .glossa.yml and customize as needed".dimmed());
    println!();
    println!("{}", GlossaConfig::default().to_yaml_string()?);
    Ok(())
}

/// Initialize a configuration file with defaults
pub fn init_config(args: &InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "Configuration file already exists: {}. Use --force to overwrite or choose a different name with --output",
            args.output.display()
        );
    }

    GlossaConfig::default().to_yaml_file(args.output.clone())?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!();
    println!("{}", "🔧 Key settings you can customize:".bright_blue().bold());

    #[derive(Tabled)]
    struct CustomizationRow {
        setting: &'static str,
        description: &'static str,
    }

    let rows = vec![
        CustomizationRow {
            setting: "dataset.glossary",
            description: "Glossary file, as a data:/output: URI or a path",
        },
        CustomizationRow {
            setting: "graph.edge_weighting",
            description: "binary or reference_count",
        },
        CustomizationRow {
            setting: "graph.resolution",
            description: "Louvain resolution (higher = more communities)",
        },
        CustomizationRow {
            setting: "semantic.k",
            description: "Number of definition clusters",
        },
        CustomizationRow {
            setting: "semantic.seed",
            description: "Seed for k-means++ initialization",
        },
        CustomizationRow {
            setting: "pipeline.parallel_partitioners",
            description: "Run both partitioners concurrently",
        },
    ];
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
    Ok(())
}
