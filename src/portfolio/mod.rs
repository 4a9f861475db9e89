pub mod types;
pub mod parser;
pub mod fetcher;
pub mod analyzer;
pub mod registry;
pub mod selection;
pub mod comparison;

pub use types::*;
pub use fetcher::{HoldingsFetcher, HttpPageSource, PageSource};
pub use analyzer::OverlapEngine;
pub use registry::FundRegistry;
pub use selection::FundSelection;
pub use comparison::{ComparisonOutcome, FetchedFunds, FundComparison};
