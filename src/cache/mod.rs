pub mod manager;
pub mod strategies;

pub use manager::{CacheConfig, CacheManager};
pub use strategies::{CacheStats, TtlCache};
