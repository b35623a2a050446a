mod config;
mod dom;
mod error;
mod extract;
mod pipeline;
mod session;
mod snapshot;
mod store;
mod user_agent;

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use config::Settings;
use snapshot::MarketSnapshot;

#[derive(Parser)]
#[command(name = "btc_snapshot", about = "Capture Bitcoin market metrics into a CSV log")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture one snapshot and append it to the log (default)
    Run {
        /// Also print the snapshot as JSON
        #[arg(long)]
        json: bool,
        /// Render and extract without writing the log
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the most recent snapshots in the log
    Show {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Run {
        json: false,
        dry_run: false,
    });

    let result = match command {
        Commands::Run { json, dry_run } => capture(&cli.settings, json, dry_run).await,
        Commands::Show { limit } => show(&cli.settings.output, limit),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn capture(settings: &Settings, json: bool, dry_run: bool) -> anyhow::Result<()> {
    println!("Scraping Bitcoin data...");
    let output = (!dry_run).then_some(settings.output.as_path());

    let snapshot = match pipeline::run(settings, output).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            println!("❌ Failed to scrape data: {}", e);
            return Err(e).context("capture failed");
        }
    };

    if dry_run {
        print_table(std::slice::from_ref(&snapshot));
        println!("\nDry run: nothing written to {}", settings.output.display());
    } else {
        println!("✅ Data saved to {}", settings.output.display());
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}

fn show(path: &Path, limit: usize) -> anyhow::Result<()> {
    let rows = store::load(path).with_context(|| format!("reading {}", path.display()))?;
    if rows.is_empty() {
        println!("No snapshots recorded in {}.", path.display());
        return Ok(());
    }

    let recent = &rows[rows.len().saturating_sub(limit)..];
    print_table(recent);
    println!(
        "\n{} of {} snapshots | {}",
        recent.len(),
        rows.len(),
        path.display()
    );
    Ok(())
}

const LABELS: [&str; 8] = ["Time", "Price", "Mkt cap", "Vol 24h", "Supply", "24h", "Bull", "Bear"];
const WIDTHS: [usize; 8] = [19, 14, 10, 10, 18, 8, 6, 6];

fn print_table(rows: &[MarketSnapshot]) {
    println!("{}", table_line(LABELS));
    println!("{}", "-".repeat(WIDTHS.iter().sum::<usize>() + 3 * (WIDTHS.len() - 1)));
    for r in rows {
        println!("{}", table_line(r.values()));
    }
}

fn table_line(cells: [&str; 8]) -> String {
    cells
        .iter()
        .zip(WIDTHS)
        .map(|(c, w)| format!("{:<w$}", truncate(c, w), w = w))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
