use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use fund_overlap::observability::init_tracing;
use fund_overlap::utils::{format_percentage, render_report, render_warnings, Config};
use fund_overlap::{
    ComparisonOutcome, FundComparison, FundRegistry, FundSelection, HoldingsFetcher, OverlapEngine, OverlapError,
    OverlapThresholds,
};

#[derive(Debug, Parser)]
#[command(name = "fund-overlap", version, about = "Check how much mutual fund holdings overlap")]
struct Cli {
    /// CSV file with "Fund Name" and "URL" columns
    #[arg(long, global = true, env = "FUND_REGISTRY_PATH")]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare the holdings of 2 to 5 funds
    Compare {
        #[arg(required = true, num_args = 2..=5)]
        funds: Vec<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Overlap % at or above which diversification is rated Low
        #[arg(long)]
        low_threshold: Option<f64>,

        /// Overlap % at or above which diversification is rated Medium
        #[arg(long)]
        medium_threshold: Option<f64>,
    },
    /// List funds in the registry
    List {
        /// Only show funds whose name contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show the scraped holdings of a single fund
    Holdings {
        fund: String,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(path) = cli.registry {
        config.registry_path = path;
    }

    init_tracing(&config)?;

    let registry = FundRegistry::from_csv_path(&config.registry_path)
        .with_context(|| format!("Failed to load fund list from {}", config.registry_path.display()))?;

    match cli.command {
        Command::List { filter } => {
            let names = match filter.as_deref() {
                Some(query) => registry.search(query),
                None => registry.names().collect(),
            };
            for name in names {
                println!("{}", name);
            }
        }
        Command::Holdings { fund, json } => {
            let fund = registry.resolve(&fund)?;
            let fetcher = HoldingsFetcher::from_config(&config)?;
            let (fetched, problem) = fetcher.fetch_or_empty(&fund.source_url).await?;
            let holdings = fetched.holdings;
            if let Some(problem) = problem {
                eprintln!("⚠️  {}: {}", fund.name, problem);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&holdings)?);
            } else {
                println!("{} ({} holdings)", fund.name, holdings.len());
                for stock in holdings {
                    println!("- {}", stock);
                }
            }
        }
        Command::Compare {
            funds,
            json,
            low_threshold,
            medium_threshold,
        } => {
            let thresholds = OverlapThresholds::new(
                low_threshold.unwrap_or(config.thresholds.low_diversification_min),
                medium_threshold.unwrap_or(config.thresholds.medium_diversification_min),
            )?;
            let selection = FundSelection::from_names(funds)?;
            let comparison = FundComparison::new(
                registry,
                HoldingsFetcher::from_config(&config)?,
                OverlapEngine::new(thresholds),
            );

            eprintln!("Fetching live holdings...");
            let fetched = comparison.fetch_all(&selection).await?;
            eprint!("{}", render_warnings(&fetched.warnings));

            match comparison.compare(&fetched) {
                Ok(report) => {
                    info!("Overlap computed: {}", format_percentage(report.overlap_percent));
                    if json {
                        let outcome = ComparisonOutcome {
                            funds: fetched.funds,
                            warnings: fetched.warnings,
                            report,
                            compared_at: Utc::now(),
                        };
                        println!("{}", serde_json::to_string_pretty(&outcome)?);
                    } else {
                        print!("{}", render_report(&report));
                    }
                }
                Err(OverlapError::InsufficientData { usable, required }) => {
                    eprintln!(
                        "⚠️  Not enough data to compare: holdings were found for {} fund(s), {} needed.",
                        usable, required
                    );
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
