mod config;
pub mod formatting;

pub use config::{Config, LogFormat};
pub use formatting::{format_percentage, format_tier, render_report, render_warnings, StyledReport};
