use std::{fs, path::Path};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, TournamentError};

pub const LOG_FILE_PREFIX: &str = "blind-draw.log";

/// Installs the global subscriber: `RUST_LOG` filter (default `info`),
/// daily rolling file under `logs_dir`. Keep the guard alive for as long
/// as logs should be flushed.
pub fn init_logging(logs_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(logs_dir)?;
    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .try_init()
        .map_err(|e| TournamentError::Config(format!("logging already initialised: {e}")))?;
    tracing::info!("Blind draw scheduler logging to {}", logs_dir.display());
    Ok(guard)
}
