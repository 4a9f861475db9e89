use std::collections::HashSet;

use crate::constants::{MAX_FUNDS_PER_COMPARISON, MIN_FUNDS_PER_COMPARISON};
use crate::errors::{OverlapError, Result};

/// Caller-owned selector state: how many fund slots are shown and what each holds.
///
/// Starts with the minimum number of slots and grows one slot at a time up to
/// the maximum. The core only ever sees `validate()`'s final list of names.
#[derive(Debug, Clone, PartialEq)]
pub struct FundSelection {
    slots: Vec<Option<String>>,
}

impl Default for FundSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl FundSelection {
    pub fn new() -> Self {
        Self {
            slots: vec![None; MIN_FUNDS_PER_COMPARISON],
        }
    }

    /// One slot per name, filled in order.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() > MAX_FUNDS_PER_COMPARISON {
            return Err(OverlapError::selection(format!(
                "at most {} funds can be compared, got {}",
                MAX_FUNDS_PER_COMPARISON,
                names.len()
            )));
        }

        let mut selection = Self::new();
        while selection.slot_count() < names.len() {
            selection.add_slot();
        }
        for (index, name) in names.into_iter().enumerate() {
            selection.select(index, name)?;
        }
        Ok(selection)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn can_add_slot(&self) -> bool {
        self.slots.len() < MAX_FUNDS_PER_COMPARISON
    }

    /// Returns false once the maximum is reached.
    pub fn add_slot(&mut self) -> bool {
        if !self.can_add_slot() {
            return false;
        }
        self.slots.push(None);
        true
    }

    pub fn select(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        let slot_count = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            OverlapError::selection(format!("slot {} out of range (0..{})", index, slot_count))
        })?;

        let name = name.into();
        let name = name.trim();
        *slot = if name.is_empty() { None } else { Some(name.to_string()) };
        Ok(())
    }

    pub fn clear(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = None;
        }
    }

    /// Filled slots, in slot order.
    pub fn selected_names(&self) -> Vec<&str> {
        self.slots.iter().flatten().map(String::as_str).collect()
    }

    /// The names to compare: at least two, no duplicates.
    pub fn validate(&self) -> Result<Vec<String>> {
        let names = self.selected_names();

        if names.len() < MIN_FUNDS_PER_COMPARISON {
            return Err(OverlapError::selection(format!(
                "select at least {} funds, got {}",
                MIN_FUNDS_PER_COMPARISON,
                names.len()
            )));
        }

        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(*name) {
                return Err(OverlapError::selection(format!("'{}' selected more than once", name)));
            }
        }

        Ok(names.into_iter().map(String::from).collect())
    }
}
