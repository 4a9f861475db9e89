use indexmap::IndexMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use super::types::Fund;
use crate::constants::{REGISTRY_NAME_COLUMN, REGISTRY_URL_COLUMN};
use crate::errors::{OverlapError, Result};

/// Fund name to holdings-page URL lookup, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct FundRegistry {
    funds: IndexMap<String, String>,
}

impl FundRegistry {
    /// Build from (name, url) pairs. Pairs with a blank name or URL are dropped;
    /// the first URL seen for a name wins.
    pub fn from_entries<I, N, U>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, U)>,
        N: AsRef<str>,
        U: AsRef<str>,
    {
        let mut funds = IndexMap::new();

        for (name, url) in entries {
            let (name, url) = (name.as_ref().trim(), url.as_ref().trim());
            if name.is_empty() || url.is_empty() {
                debug!("Skipping registry row with missing field: {:?} -> {:?}", name, url);
                continue;
            }
            if funds.contains_key(name) {
                warn!("Duplicate fund '{}' in registry, keeping first URL", name);
                continue;
            }
            funds.insert(name.to_string(), url.to_string());
        }

        Self { funds }
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| OverlapError::registry(format!("cannot open {}: {}", path.display(), e)))?;

        let registry = Self::from_csv_reader(file)?;
        info!("Loaded {} funds from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// Parse CSV with `Fund Name` and `URL` header columns (any order, case-insensitive).
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let column = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(wanted))
                .ok_or_else(|| OverlapError::registry(format!("missing '{}' column", wanted)))
        };
        let name_col = column(REGISTRY_NAME_COLUMN)?;
        let url_col = column(REGISTRY_URL_COLUMN)?;

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            entries.push((
                record.get(name_col).unwrap_or("").to_string(),
                record.get(url_col).unwrap_or("").to_string(),
            ));
        }

        Ok(Self::from_entries(entries))
    }

    pub fn url_for(&self, name: &str) -> Option<&str> {
        self.funds.get(name.trim()).map(String::as_str)
    }

    /// Build a `Fund` for `name`, ready to be fetched.
    pub fn resolve(&self, name: &str) -> Result<Fund> {
        let name = name.trim();
        self.url_for(name)
            .map(|url| Fund::new(name, url))
            .ok_or_else(|| OverlapError::registry(format!("unknown fund '{}'", name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funds.keys().map(String::as_str)
    }

    /// Case-insensitive substring match over fund names, in registry order.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.trim().to_lowercase();
        self.names()
            .filter(|name| name.to_lowercase().contains(&query))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }
}
