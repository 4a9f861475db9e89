use super::strategies::{CacheStats, TtlCache};
use crate::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS};
use crate::errors::Result;
use crate::portfolio::FetchedHoldings;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub holdings_ttl: Duration,
    pub max_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            holdings_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Session cache for scraped holdings, keyed by fund URL.
pub struct CacheManager {
    holdings_cache: TtlCache<FetchedHoldings>,
}

impl CacheManager {
    pub fn new(config: CacheConfig) -> Self {
        info!("Initializing holdings cache with config: {:?}", config);

        Self {
            holdings_cache: TtlCache::new(config.max_capacity, config.holdings_ttl),
        }
    }

    fn holdings_key(url: &str) -> String {
        format!("holdings:{}", url)
    }

    /// Return cached holdings for `url`, running `fetch` only on a miss.
    ///
    /// A successful fetch is stamped with the current time when it is stored.
    /// Errors from `fetch` are returned as-is and nothing is cached for them.
    pub async fn get_or_fetch_holdings<F, Fut>(&self, url: &str, fetch: F) -> Result<FetchedHoldings>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>>>,
    {
        let key = Self::holdings_key(url);
        self.holdings_cache
            .get_or_try_init(&key, || async move { fetch().await.map(FetchedHoldings::now) })
            .await
    }

    pub async fn get_holdings(&self, url: &str) -> Option<FetchedHoldings> {
        self.holdings_cache.get(&Self::holdings_key(url)).await
    }

    pub async fn invalidate_holdings(&self, url: &str) {
        if self.holdings_cache.remove(&Self::holdings_key(url)).await {
            debug!("Invalidated cached holdings for {}", url);
        }
    }

    pub async fn clear_all(&self) {
        self.holdings_cache.clear().await;
        info!("Holdings cache cleared");
    }

    pub async fn stats(&self) -> CacheStats {
        self.holdings_cache.stats().await
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
