//! Utility functions for formatting comparison results

use console::style;
use std::fmt;

use crate::portfolio::{DiversificationTier, FundWarning, OverlapReport};

/// Format percentage for display
pub fn format_percentage(pct: f64) -> String {
    format!("{:.2}%", pct)
}

/// Diversification tier styled with its colour hint
pub fn format_tier(tier: DiversificationTier) -> String {
    let styled = match tier {
        DiversificationTier::Low => style(tier.as_str()).red(),
        // closest terminal colour to orange
        DiversificationTier::Medium => style(tier.as_str()).yellow(),
        DiversificationTier::High => style(tier.as_str()).green(),
    };
    styled.bold().to_string()
}

pub fn render_warnings(warnings: &[FundWarning]) -> String {
    warnings.iter().map(|warning| format!("⚠️  {}\n", warning)).collect()
}

/// Terminal view of a report: score, overlap and the sorted common stocks
pub struct StyledReport<'a>(pub &'a OverlapReport);

impl fmt::Display for StyledReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;

        writeln!(f, "📊 Results")?;
        writeln!(f, "Diversification Score: {}", format_tier(report.tier))?;
        writeln!(f, "Overlap %: {}", format_percentage(report.overlap_percent))?;
        writeln!(f, "Funds compared: {}", report.fund_count)?;
        if !report.excluded_funds.is_empty() {
            writeln!(f, "Excluded (no holdings): {}", report.excluded_funds.join(", "))?;
        }

        writeln!(f)?;
        writeln!(f, "Common Stocks:")?;
        if report.shared_stocks.is_empty() {
            return writeln!(f, "None");
        }
        for stock in &report.shared_stocks {
            writeln!(f, "- {}", stock)?;
        }
        Ok(())
    }
}

pub fn render_report(report: &OverlapReport) -> String {
    StyledReport(report).to_string()
}
