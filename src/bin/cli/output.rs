//! Console output: headings, summaries and tables.

use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use glossa_rs::core::glossary::ValidationSummary;
use glossa_rs::io::reports::TrendSummary;
use glossa_rs::{AgreementRecord, CommunityDetection, Diagnostics, RunContext, SemanticClustering};

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Run")]
    run: String,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Terms")]
    terms: usize,
    #[tabled(rename = "Graph clusters")]
    graph_clusters: usize,
    #[tabled(rename = "Semantic clusters")]
    semantic_clusters: usize,
    #[tabled(rename = "ARI")]
    ari: String,
}

fn metric(metric: &str, value: impl ToString) -> MetricRow {
    MetricRow {
        metric: metric.to_string(),
        value: value.to_string(),
    }
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");
}

pub fn heading(text: &str) {
    println!("{}", text.bright_blue().bold());
}

pub fn success(text: &str) {
    println!("{} {}", "✅".green(), text.bright_green().bold());
}

pub fn print_validation(path: &str, summary: &ValidationSummary) {
    success(&format!("Glossary {path} is valid"));
    print_table(vec![
        metric("Terms", summary.terms),
        metric("Terms with references", summary.terms_with_references),
        metric("Empty definitions", summary.empty_definitions),
        metric("Unresolved references", summary.unresolved_references),
        metric("Self references", summary.self_references),
        metric("Duplicate references", summary.duplicate_references),
    ]);
}

pub fn print_graph_partition(detection: &CommunityDetection) {
    heading("🕸  Graph partition");
    print_table(vec![
        metric("Terms", detection.partition.len()),
        metric("Communities", detection.communities.len()),
        metric("Non-trivial communities", detection.non_trivial_communities().count()),
        metric("Modularity", format!("{:.4}", detection.modularity)),
        metric("Passes", detection.passes),
    ]);
}

pub fn print_semantic_partition(clustering: &SemanticClustering) {
    heading("📚 Semantic partition");
    print_table(vec![
        metric("Terms", clustering.partition.len()),
        metric("Clusters", clustering.partition.num_clusters()),
        metric("k used", clustering.k_effective),
        metric("Vocabulary", clustering.corpus.vocabulary_size),
        metric("Inertia", format!("{:.4}", clustering.inertia)),
        metric("Iterations", clustering.iterations),
        metric("Converged", clustering.converged),
    ]);
}

pub fn print_agreement(record: &AgreementRecord) {
    heading("⚖  Agreement");
    let score = format!("{:.4}", record.adjusted_rand_index);
    let styled = if record.adjusted_rand_index >= 0.5 {
        score.green().to_string()
    } else if record.adjusted_rand_index >= 0.0 {
        score.yellow().to_string()
    } else {
        score.red().to_string()
    };
    println!("  Adjusted Rand Index: {}", styled.bold());
    println!(
        "  {} graph clusters vs {} semantic clusters over {} terms",
        record.graph_clusters, record.semantic_clusters, record.num_terms
    );
}

pub fn print_diagnostics(diagnostics: &Diagnostics) {
    if !diagnostics.has_warnings() {
        return;
    }
    println!("{}", "⚠  Degenerate input (not fatal)".yellow().bold());
    let counts = [
        ("unresolved references dropped", diagnostics.unresolved_references),
        ("self references ignored", diagnostics.self_references),
        ("duplicate references collapsed", diagnostics.duplicate_references),
        ("empty definitions", diagnostics.empty_definitions),
        ("isolated terms", diagnostics.isolated_terms),
    ];
    for (label, count) in counts.iter().filter(|(_, count)| *count > 0) {
        println!("  {count} {label}");
    }
}

pub fn print_run_footer(ctx: &RunContext) {
    println!();
    println!(
        "{} {} ({})",
        "Run".dimmed(),
        ctx.run_name().cyan(),
        ctx.run_id().to_string().dimmed()
    );
    for artifact in ctx.artifacts() {
        println!("  {} {}", artifact.kind.dimmed(), artifact.path.display());
    }
}

pub fn print_history(records: &[AgreementRecord], trend: Option<&TrendSummary>) {
    let Some(trend) = trend else {
        println!("{}", "No agreement history yet; run `glossa run` or `glossa evaluate` first".yellow());
        return;
    };

    heading("📈 Agreement history");
    let rows = records
        .iter()
        .map(|record| HistoryRow {
            run: record.run_name.clone(),
            timestamp: record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            terms: record.num_terms,
            graph_clusters: record.graph_clusters,
            semantic_clusters: record.semantic_clusters,
            ari: format!("{:.4}", record.adjusted_rand_index),
        })
        .collect();
    print_table::<HistoryRow>(rows);

    let delta = match trend.delta {
        Some(delta) if delta > 0.0 => format!("+{delta:.4}").green().to_string(),
        Some(delta) if delta < 0.0 => format!("{delta:.4}").red().to_string(),
        Some(delta) => format!("{delta:.4}"),
        None => "n/a".to_string(),
    };
    println!(
        "  {} runs | mean {:.4} | min {:.4} | max {:.4} | last change {}",
        trend.runs, trend.mean, trend.min, trend.max, delta
    );
}
