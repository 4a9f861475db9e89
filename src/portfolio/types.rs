use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::constants::{DEFAULT_LOW_DIVERSIFICATION_THRESHOLD, DEFAULT_MEDIUM_DIVERSIFICATION_THRESHOLD};
use crate::errors::{OverlapError, Result};

/// A fund selected for comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    pub name: String,
    pub source_url: String,
    /// Empty when the fetch failed
    pub holdings: BTreeSet<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Fund {
    pub fn new(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            holdings: BTreeSet::new(),
            fetched_at: None,
        }
    }

    pub fn set_holdings<I>(&mut self, holdings: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.holdings = holdings.into_iter().collect();
    }

    /// Take holdings from a fetch result, keeping its original fetch time.
    pub fn apply_fetch(&mut self, fetched: FetchedHoldings) {
        self.set_holdings(fetched.holdings);
        self.fetched_at = fetched.fetched_at;
    }

    pub fn has_holdings(&self) -> bool {
        !self.holdings.is_empty()
    }
}

/// Holdings scraped from one fund page
///
/// `fetched_at` is when the page was actually downloaded, so it stays the same
/// for later cache hits. It is `None` when the fetch failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchedHoldings {
    pub holdings: Vec<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl FetchedHoldings {
    pub fn now(holdings: Vec<String>) -> Self {
        Self {
            holdings,
            fetched_at: Some(Utc::now()),
        }
    }
}

/// Diversification rating derived from overlap. High diversification means low overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiversificationTier {
    Low,
    Medium,
    High,
}

impl DiversificationTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiversificationTier::Low => "Low",
            DiversificationTier::Medium => "Medium",
            DiversificationTier::High => "High",
        }
    }

    /// Display colour hint for front ends
    pub fn color(&self) -> &'static str {
        match self {
            DiversificationTier::Low => "red",
            DiversificationTier::Medium => "orange",
            DiversificationTier::High => "green",
        }
    }
}

impl fmt::Display for DiversificationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overlap cutoffs for tiering. Each band includes its lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlapThresholds {
    /// Overlap % at or above which diversification is Low
    pub low_diversification_min: f64,
    /// Overlap % at or above which diversification is Medium
    pub medium_diversification_min: f64,
}

impl Default for OverlapThresholds {
    fn default() -> Self {
        Self {
            low_diversification_min: DEFAULT_LOW_DIVERSIFICATION_THRESHOLD,
            medium_diversification_min: DEFAULT_MEDIUM_DIVERSIFICATION_THRESHOLD,
        }
    }
}

impl OverlapThresholds {
    pub fn new(low_diversification_min: f64, medium_diversification_min: f64) -> Result<Self> {
        let thresholds = Self {
            low_diversification_min,
            medium_diversification_min,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        let (low, medium) = (self.low_diversification_min, self.medium_diversification_min);

        if !low.is_finite() || !medium.is_finite() {
            return Err(OverlapError::Config("Overlap thresholds must be finite numbers".into()));
        }
        if medium < 0.0 || low > 100.0 {
            return Err(OverlapError::Config(format!(
                "Overlap thresholds must lie within 0-100 (got medium {}, low {})",
                medium, low
            )));
        }
        if medium >= low {
            return Err(OverlapError::Config(format!(
                "Medium threshold ({}) must be below the low-diversification threshold ({})",
                medium, low
            )));
        }

        Ok(())
    }

    pub fn classify(&self, overlap_percent: f64) -> DiversificationTier {
        if overlap_percent >= self.low_diversification_min {
            DiversificationTier::Low
        } else if overlap_percent >= self.medium_diversification_min {
            DiversificationTier::Medium
        } else {
            DiversificationTier::High
        }
    }
}

/// Result of comparing the holdings of two or more funds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapReport {
    /// 0-100
    pub overlap_percent: f64,
    pub tier: DiversificationTier,
    /// Stocks held by at least two of the compared funds
    pub shared_stocks: BTreeSet<String>,
    /// Funds that contributed holdings
    pub fund_count: usize,
    /// Funds dropped because their holdings were empty
    pub excluded_funds: Vec<String>,
}

/// A per-fund problem that did not stop the comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundWarning {
    pub fund: String,
    pub message: String,
}

impl fmt::Display for FundWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.fund, self.message)
    }
}
