//! Logging setup for the `scour` binary.
//!
//! Logs go to the console and to daily-rolling files in the platform data
//! directory:
//!
//! - `scour.<date>.log`: everything the filter lets through
//! - `error.<date>.log`: warnings and errors only, which is where every
//!   repaired violation ends up
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is up to the caller.
//!
//! ```no_run
//! scour::logging::init().expect("Failed to initialize logging");
//! tracing::info!("Validation started");
//! ```

use crate::error::{Result, ResultExt as _, ScourError};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const MAX_LOG_FILES: usize = 10;

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/scour/logs`
/// - macOS: `~/Library/Application Support/scour/logs`
/// - Linux: `~/.local/share/scour/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir()
        .ok_or_else(|| ScourError::Config("Failed to determine data directory".to_owned()))?;

    let log_dir = base_dir.join("scour").join("logs");
    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

fn appender(log_dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| ScourError::Config(format!("Failed to create {prefix} log appender: {e}")))
}

/// Initializes console and file logging.
///
/// The level defaults to `info` and can be overridden with `RUST_LOG`.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or a file appender
/// fails.
pub fn init() -> Result<()> {
    let log_dir = get_log_dir()?;
    let all_logs_appender = appender(&log_dir, "scour")?;
    let error_logs_appender = appender(&log_dir, "error")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| ScourError::Config(format!("Failed to create env filter: {e}")))?;

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(all_logs_appender);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(error_logs_appender)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .map_err(|e| ScourError::Config(format!("Failed to install subscriber: {e}")))?;

    tracing::info!("Logging initialized, log directory: {}", log_dir.display());
    Ok(())
}

/// Gets the path to today's log file
pub fn get_current_log_path() -> Result<PathBuf> {
    let log_dir = get_log_dir()?;
    let today = chrono::Local::now().format("%Y-%m-%d");
    Ok(log_dir.join(format!("scour.{today}.log")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_log_dir() {
        let log_dir = get_log_dir().expect("Failed to get log dir");
        assert!(log_dir.ends_with("scour/logs") || log_dir.ends_with("scour\\logs"));
    }

    #[test]
    fn test_current_log_path_is_dated() {
        let path = get_current_log_path().expect("Failed to get log path");
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.starts_with("scour.") && name.ends_with(".log"));
    }
}
