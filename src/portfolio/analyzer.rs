use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::types::{OverlapReport, OverlapThresholds};
use crate::constants::MIN_FUNDS_PER_COMPARISON;
use crate::errors::{OverlapError, Result};

/// Computes cross-fund holdings overlap and the resulting diversification tier
#[derive(Debug, Clone, Default)]
pub struct OverlapEngine {
    thresholds: OverlapThresholds,
}

impl OverlapEngine {
    pub fn new(thresholds: OverlapThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &OverlapThresholds {
        &self.thresholds
    }

    /// Compare the holdings of several funds.
    ///
    /// For each fund `i` with holdings `S_i`, `O_i` is the part of `S_i` held by
    /// at least one other fund. The overlap is `100 * Σ|O_i| / Σ|S_i|`, which for
    /// two funds is `2|A ∩ B| / (|A| + |B|) * 100`. Funds with no holdings are
    /// excluded; fewer than two remaining is `InsufficientData`. Entries sharing a
    /// fund name are merged.
    pub fn compare<I, K, H, S>(&self, funds: I) -> Result<OverlapReport>
    where
        I: IntoIterator<Item = (K, H)>,
        K: AsRef<str>,
        H: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (name, holdings) in funds {
            sets.entry(name.as_ref().to_string())
                .or_default()
                .extend(holdings.into_iter().map(|s| s.as_ref().to_string()));
        }

        let (usable, excluded): (BTreeMap<_, _>, BTreeMap<_, _>) =
            sets.into_iter().partition(|(_, set)| !set.is_empty());
        let excluded_funds: Vec<String> = excluded.into_keys().collect();

        if usable.len() < MIN_FUNDS_PER_COMPARISON {
            return Err(OverlapError::InsufficientData {
                usable: usable.len(),
                required: MIN_FUNDS_PER_COMPARISON,
            });
        }

        // Number of funds holding each stock
        let mut frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for set in usable.values() {
            for stock in set {
                *frequency.entry(stock.as_str()).or_insert(0) += 1;
            }
        }

        let numerator: usize = usable
            .values()
            .map(|set| set.iter().filter(|s| frequency[s.as_str()] >= 2).count())
            .sum();
        let denominator: usize = usable.values().map(BTreeSet::len).sum();

        let overlap_percent = if denominator > 0 {
            100.0 * numerator as f64 / denominator as f64
        } else {
            0.0
        };

        let shared_stocks: BTreeSet<String> = frequency
            .into_iter()
            .filter(|(_, count)| *count >= 2)
            .map(|(stock, _)| stock.to_string())
            .collect();

        let tier = self.thresholds.classify(overlap_percent);

        debug!(
            "Overlap numerator {} / denominator {} across {} funds",
            numerator,
            denominator,
            usable.len()
        );
        info!(
            "Overlap {:.2}% ({} diversification), {} shared stocks",
            overlap_percent,
            tier,
            shared_stocks.len()
        );

        Ok(OverlapReport {
            overlap_percent,
            tier,
            shared_stocks,
            fund_count: usable.len(),
            excluded_funds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::types::DiversificationTier;

    fn set(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_three_fund_example() {
        let engine = OverlapEngine::default();
        let report = engine
            .compare(vec![
                ("A", set(&["X", "Y", "Z"])),
                ("B", set(&["Y", "Z", "W"])),
                ("C", set(&["Z", "Q", "R"])),
            ])
            .unwrap();

        assert!((report.overlap_percent - 500.0 / 9.0).abs() < 1e-9);
        assert_eq!(report.tier, DiversificationTier::Low);
        let expected: BTreeSet<String> = ["Y", "Z"].iter().map(|s| s.to_string()).collect();
        assert_eq!(report.shared_stocks, expected);
        assert_eq!(report.fund_count, 3);
        assert!(report.excluded_funds.is_empty());
    }

    #[test]
    fn test_two_funds_use_average_size() {
        let engine = OverlapEngine::default();
        let report = engine
            .compare(vec![
                ("Alpha", set(&["A", "B", "C", "D"])),
                ("Beta", set(&["C", "D", "E", "F", "G", "H"])),
            ])
            .unwrap();

        // |A ∩ B| = 2, average size = 5
        assert!((report.overlap_percent - 40.0).abs() < 1e-9);
        assert_eq!(report.tier, DiversificationTier::Low);
    }

    #[test]
    fn test_disjoint_funds() {
        let report = OverlapEngine::default()
            .compare(vec![("A", set(&["X"])), ("B", set(&["Y"]))])
            .unwrap();

        assert_eq!(report.overlap_percent, 0.0);
        assert_eq!(report.tier, DiversificationTier::High);
        assert!(report.shared_stocks.is_empty());
    }

    #[test]
    fn test_identical_funds() {
        let report = OverlapEngine::default()
            .compare(vec![("A", set(&["X", "Y"])), ("B", set(&["Y", "X"]))])
            .unwrap();

        assert_eq!(report.overlap_percent, 100.0);
    }

    #[test]
    fn test_empty_fund_excluded() {
        let report = OverlapEngine::default()
            .compare(vec![
                ("A", set(&["X", "Y"])),
                ("Broken", set(&[])),
                ("B", set(&["Y", "Z"])),
            ])
            .unwrap();

        assert_eq!(report.fund_count, 2);
        assert_eq!(report.excluded_funds, vec!["Broken".to_string()]);
        assert!((report.overlap_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_usable_fund_is_insufficient() {
        let err = OverlapEngine::default()
            .compare(vec![("A", set(&["X"])), ("B", set(&[]))])
            .unwrap_err();

        assert!(matches!(err, OverlapError::InsufficientData { usable: 1, required: 2 }));
    }

    #[test]
    fn test_no_funds_is_insufficient() {
        let funds: Vec<(&str, Vec<String>)> = Vec::new();
        let err = OverlapEngine::default().compare(funds).unwrap_err();
        assert!(matches!(err, OverlapError::InsufficientData { usable: 0, .. }));
    }

    #[test]
    fn test_duplicate_holdings_within_fund_count_once() {
        let report = OverlapEngine::default()
            .compare(vec![("A", set(&["X", "X", "Y"])), ("B", set(&["X", "Z"]))])
            .unwrap();

        // {X, Y} vs {X, Z}
        assert!((report.overlap_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_thresholds_applied() {
        let engine = OverlapEngine::new(OverlapThresholds::new(50.0, 20.0).unwrap());
        let report = engine
            .compare(vec![
                ("Alpha", set(&["A", "B", "C", "D"])),
                ("Beta", set(&["C", "D", "E", "F", "G", "H"])),
            ])
            .unwrap();

        assert_eq!(report.tier, DiversificationTier::Medium);
    }
}
