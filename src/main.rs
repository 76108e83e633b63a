use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use delivery_kpis::dataset::load_dataset;
use delivery_kpis::{compute, KpiConfig, KpiReport};

#[derive(Parser)]
#[command(name = "delivery-kpis")]
#[command(about = "Tactical delivery KPIs from a work-item export", long_about = None)]
struct Cli {
    /// TOML file with the sprint calendar and field names
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the four KPIs for an export
    Kpis {
        #[arg(long)]
        input: PathBuf,
        /// Only items planned in this sprint
        #[arg(long)]
        sprint: Option<i64>,
        /// Only items of these work-item types (repeatable)
        #[arg(long = "type")]
        types: Vec<String>,
        /// Only items in this state
        #[arg(long)]
        state: Option<String>,
        /// Print the result set as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the sprints named in an export with their resolved dates
    Sprints {
        #[arg(long)]
        input: PathBuf,
    },
    /// Show the start, end and tolerance dates of one sprint
    Resolve { sprint: i64 },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("delivery_kpis=info"))?,
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Kpis {
            input,
            sprint,
            types,
            state,
            json,
        } => {
            let mut dataset = load_dataset(&input)
                .with_context(|| format!("failed to load export {}", input.display()))?;
            if let Some(sprint) = sprint {
                dataset = dataset.filter_by_sprint(&config.fields, sprint);
            }
            dataset = dataset.filter_by_types(&config.fields, &types);
            if let Some(state) = state.as_deref() {
                dataset = dataset.filter_by_state(&config.fields, state);
            }
            info!(rows = dataset.len(), "computing kpis");

            let report = compute(&dataset, &config);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Sprints { input } => {
            let dataset = load_dataset(&input)
                .with_context(|| format!("failed to load export {}", input.display()))?;
            let sprints = dataset.available_sprints(&config.fields);

            if sprints.is_empty() {
                println!("No sprints found in this export.");
                return Ok(());
            }

            println!("Sprints in {}:", input.display());
            for sprint in sprints {
                let window = config.calendar.resolve(sprint);
                println!(
                    "- Sprint {} {} to {}",
                    sprint,
                    display_date(window.start),
                    display_date(window.end)
                );
            }
        }
        Commands::Resolve { sprint } => {
            let window = config.calendar.resolve(sprint);
            println!("Sprint {sprint}");
            println!("  start:     {}", display_date(window.start));
            println!("  end:       {}", display_date(window.end));
            println!("  tolerance: {}", display_date(window.end_tol));
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<KpiConfig> {
    match path {
        Some(path) => KpiConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(KpiConfig::default()),
    }
}

fn print_report(report: &KpiReport) {
    for (name, result) in report.entries() {
        let unit = result.unit.as_deref().unwrap_or("");
        let value = format!("{:.1} {unit}", result.value);
        let mut line = format!("- {name}: {}", value.trim_end());
        if let Some(message) = &result.message {
            line.push_str(&format!(" [{message}]"));
        }
        if let Some(tier) = result.tier {
            line.push_str(&format!(" ({})", tier.as_str()));
        }
        println!("{line}");
    }
}

fn display_date(date: Option<chrono::NaiveDate>) -> String {
    date.map_or_else(|| "unknown".to_string(), |date| date.to_string())
}
