/// Zero-based position of the holdings table among the page's `<table>` elements.
pub const HOLDINGS_TABLE_INDEX: usize = 4;

/// The holdings site rejects default client identifiers.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

// Overlap % at or above which diversification is rated "Low".
pub const DEFAULT_LOW_DIVERSIFICATION_THRESHOLD: f64 = 40.0;
// Overlap % at or above which diversification is rated "Medium".
pub const DEFAULT_MEDIUM_DIVERSIFICATION_THRESHOLD: f64 = 20.0;

pub const MIN_FUNDS_PER_COMPARISON: usize = 2;
pub const MAX_FUNDS_PER_COMPARISON: usize = 5;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

pub const DEFAULT_REGISTRY_PATH: &str = "fund_urls.csv";
pub const REGISTRY_NAME_COLUMN: &str = "Fund Name";
pub const REGISTRY_URL_COLUMN: &str = "URL";

pub const DEFAULT_LOG_LEVEL: &str = "info";
