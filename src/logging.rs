//! Logging setup
//!
//! Installs a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
//! Output goes to stdout through a non-blocking writer; keep the returned
//! guard alive for the life of the process or buffered lines are lost.

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

const DEFAULT_FILTER: &str = "info";

/// Initialize the global subscriber
pub fn init_logging(format: LogFormat) -> Result<WorkerGuard> {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    match format {
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?,
        LogFormat::Pretty => builder
            .with_ansi(false)
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?,
    }

    Ok(guard)
}
