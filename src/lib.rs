//! Mutual fund overlap checker.
//!
//! Scrapes each fund's current holdings from its public portfolio page and
//! measures how much the funds' stock lists overlap, as a rough gauge of
//! diversification.

pub mod cache;
pub mod constants;
pub mod errors;
pub mod observability;
pub mod portfolio;
pub mod utils;

#[cfg(test)]
mod tests;

pub use errors::{OverlapError, Result};
pub use portfolio::{
    ComparisonOutcome, DiversificationTier, Fund, FundComparison, FundRegistry, FundSelection,
    FundWarning, HoldingsFetcher, OverlapEngine, OverlapReport, OverlapThresholds,
};
