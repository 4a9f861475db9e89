use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use super::analyzer::OverlapEngine;
use super::fetcher::HoldingsFetcher;
use super::registry::FundRegistry;
use super::selection::FundSelection;
use super::types::{Fund, FundWarning, OverlapReport};
use crate::errors::Result;

/// Funds with their fetched holdings, plus any per-fund problems
#[derive(Debug, Clone, Serialize)]
pub struct FetchedFunds {
    pub funds: Vec<Fund>,
    pub warnings: Vec<FundWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonOutcome {
    pub funds: Vec<Fund>,
    pub warnings: Vec<FundWarning>,
    pub report: OverlapReport,
    pub compared_at: DateTime<Utc>,
}

/// Resolves, fetches, and compares a fund selection
pub struct FundComparison {
    registry: FundRegistry,
    fetcher: HoldingsFetcher,
    engine: OverlapEngine,
}

impl FundComparison {
    pub fn new(registry: FundRegistry, fetcher: HoldingsFetcher, engine: OverlapEngine) -> Self {
        Self {
            registry,
            fetcher,
            engine,
        }
    }

    pub fn registry(&self) -> &FundRegistry {
        &self.registry
    }

    pub fn fetcher(&self) -> &HoldingsFetcher {
        &self.fetcher
    }

    /// Resolve every selected fund and fetch all of them concurrently.
    ///
    /// Unknown fund names and invalid selections fail the whole call. Fetch and
    /// schema failures only empty that fund's holdings and add a warning.
    pub async fn fetch_all(&self, selection: &FundSelection) -> Result<FetchedFunds> {
        let names = selection.validate()?;
        let mut funds = names
            .iter()
            .map(|name| self.registry.resolve(name))
            .collect::<Result<Vec<Fund>>>()?;

        info!("Fetching live holdings for {} funds", funds.len());
        let results = join_all(funds.iter().map(|fund| self.fetcher.fetch_or_empty(&fund.source_url))).await;

        let mut warnings = Vec::new();
        for (fund, result) in funds.iter_mut().zip(results) {
            let (fetched, problem) = result?;
            if let Some(problem) = problem {
                warnings.push(FundWarning {
                    fund: fund.name.clone(),
                    message: problem.to_string(),
                });
            }
            fund.apply_fetch(fetched);
        }

        Ok(FetchedFunds { funds, warnings })
    }

    /// Run the overlap engine over already-fetched funds.
    pub fn compare(&self, fetched: &FetchedFunds) -> Result<OverlapReport> {
        let report = self
            .engine
            .compare(fetched.funds.iter().map(|fund| (fund.name.as_str(), fund.holdings.iter())));

        if let Err(e) = &report {
            warn!("Comparison did not run: {}", e);
        }
        report
    }

    pub async fn run(&self, selection: &FundSelection) -> Result<ComparisonOutcome> {
        let fetched = self.fetch_all(selection).await?;
        let report = self.compare(&fetched)?;

        Ok(ComparisonOutcome {
            funds: fetched.funds,
            warnings: fetched.warnings,
            report,
            compared_at: Utc::now(),
        })
    }
}
