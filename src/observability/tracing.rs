use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::errors::{OverlapError, Result};
use crate::utils::{Config, LogFormat};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Logs go to stderr so report output on stdout stays machine-readable.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| OverlapError::Config(format!("Invalid log level '{}': {}", config.log_level, e)))?;

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .map_err(|e| OverlapError::Config(format!("Failed to initialize tracing: {}", e)))?;

    info!("Tracing initialized (level: {}, format: {:?})", config.log_level, config.log_format);
    Ok(())
}
