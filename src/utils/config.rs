use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    DEFAULT_REGISTRY_PATH, DEFAULT_USER_AGENT,
};
use crate::errors::{OverlapError, Result};
use crate::portfolio::OverlapThresholds;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Fund registry
    pub registry_path: PathBuf,

    // Overlap policy
    pub thresholds: OverlapThresholds,

    // Fetching
    pub user_agent: String,
    pub fetch_timeout_secs: u64,

    // Holdings cache
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from(DEFAULT_REGISTRY_PATH),
            thresholds: OverlapThresholds::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            registry_path: get("FUND_REGISTRY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.registry_path),

            thresholds: OverlapThresholds {
                low_diversification_min: parse_or(
                    get("OVERLAP_LOW_THRESHOLD"),
                    "OVERLAP_LOW_THRESHOLD",
                    defaults.thresholds.low_diversification_min,
                )?,
                medium_diversification_min: parse_or(
                    get("OVERLAP_MEDIUM_THRESHOLD"),
                    "OVERLAP_MEDIUM_THRESHOLD",
                    defaults.thresholds.medium_diversification_min,
                )?,
            },

            user_agent: get("FETCH_USER_AGENT").unwrap_or(defaults.user_agent),
            fetch_timeout_secs: parse_or(
                get("FETCH_TIMEOUT_SECS"),
                "FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout_secs,
            )?,

            cache_ttl_secs: parse_or(
                get("HOLDINGS_CACHE_TTL_SECS"),
                "HOLDINGS_CACHE_TTL_SECS",
                defaults.cache_ttl_secs,
            )?,
            cache_capacity: parse_or(
                get("HOLDINGS_CACHE_CAPACITY"),
                "HOLDINGS_CACHE_CAPACITY",
                defaults.cache_capacity,
            )?,

            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: Self::parse_log_format(get("LOG_FORMAT").as_deref().unwrap_or("pretty")),
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_log_format(format: &str) -> LogFormat {
        match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;

        if self.user_agent.trim().is_empty() {
            return Err(OverlapError::Config("User agent must not be empty".into()));
        }

        if self.fetch_timeout_secs == 0 {
            return Err(OverlapError::Config("Fetch timeout must be at least 1 second".into()));
        }

        if self.cache_capacity == 0 {
            return Err(OverlapError::Config("Holdings cache capacity must be at least 1".into()));
        }

        Ok(())
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|_| OverlapError::Config(format!("{} has invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}
