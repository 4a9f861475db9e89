use thiserror::Error;

pub type Result<T> = std::result::Result<T, OverlapError>;

#[derive(Debug, Error)]
pub enum OverlapError {
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Expected portfolio table not found at {url}: {reason}")]
    Schema { url: String, reason: String },

    #[error("Insufficient data: {usable} fund(s) with holdings, at least {required} required")]
    InsufficientData { usable: usize, required: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fund registry error: {0}")]
    Registry(String),

    #[error("Invalid fund selection: {0}")]
    Selection(String),
}

impl OverlapError {
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn schema(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    pub fn selection(msg: impl Into<String>) -> Self {
        Self::Selection(msg.into())
    }

    /// Per-fund failures that downgrade to "empty holdings + warning".
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Schema { .. })
    }
}

impl From<csv::Error> for OverlapError {
    fn from(err: csv::Error) -> Self {
        Self::Registry(err.to_string())
    }
}
