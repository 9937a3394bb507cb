//! Tracing subscriber setup.

use std::io;

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use regress_serve_core::config::{LogFormat, LoggingConfig};

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `config.level` when set.
///
/// # Errors
///
/// Returns an error for an unparsable level or if a subscriber is already
/// installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    let builder = fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let installed = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
