//! Logging
//!
//! One subscriber for the whole process: a rolling log file behind a
//! non-blocking writer, plus a stderr console layer in text mode. stdout is
//! left to the CLI's JSON output.

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to open log file in {dir}: {source}")]
    Appender { dir: String, source: InitError },

    #[error("Invalid log filter {directives:?}: {reason}")]
    Filter { directives: String, reason: String },

    #[error("Global subscriber already installed: {0}")]
    Install(#[from] TryInitError),
}

/// Rotation period by config name; anything unrecognised never rotates
pub fn rotation(name: &str) -> Rotation {
    match name.to_ascii_lowercase().as_str() {
        "minutely" => Rotation::MINUTELY,
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    }
}

/// Filter used when `RUST_LOG` is unset.
///
/// sqlx logs every statement at info, which would bury the transfer log, so
/// it is held at warn unless the configured level is already stricter.
pub fn default_directives(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    match level.as_str() {
        "error" | "off" => level,
        _ => format!("{level},sqlx=warn"),
    }
}

fn env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = default_directives(level);
    EnvFilter::try_new(&directives).map_err(|e| LoggingError::Filter {
        reason: e.to_string(),
        directives,
    })
}

fn file_appender(config: &AppConfig) -> Result<RollingFileAppender, LoggingError> {
    let mut builder = RollingFileAppender::builder()
        .rotation(rotation(&config.rotation))
        .filename_prefix(config.log_file.as_str());
    if let Some(keep) = config.log_max_files {
        builder = builder.max_log_files(keep);
    }
    builder
        .build(&config.log_dir)
        .map_err(|source| LoggingError::Appender {
            dir: config.log_dir.clone(),
            source,
        })
}

/// Install the global subscriber; keep the guard alive until exit
pub fn init_logging(config: &AppConfig) -> Result<WorkerGuard, LoggingError> {
    let filter = env_filter(&config.log_level)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(config)?);
    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).try_init()?;
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stderr_layer = fmt::layer()
            .with_target(false)
            .with_ansi(true)
            .with_writer(std::io::stderr);
        registry.with(file_layer).with(stderr_layer).try_init()?;
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_names() {
        assert_eq!(rotation("hourly"), Rotation::HOURLY);
        assert_eq!(rotation("Daily"), Rotation::DAILY);
        assert_eq!(rotation("minutely"), Rotation::MINUTELY);
        assert_eq!(rotation("never"), Rotation::NEVER);
        assert_eq!(rotation("fortnightly"), Rotation::NEVER);
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives("info"), "info,sqlx=warn");
        assert_eq!(default_directives(" DEBUG "), "debug,sqlx=warn");
        assert_eq!(default_directives("error"), "error");
        assert_eq!(default_directives("off"), "off");
    }

    #[test]
    fn test_default_directives_parse() {
        for level in ["trace", "debug", "info", "warn", "error", "off"] {
            assert!(EnvFilter::try_new(default_directives(level)).is_ok(), "{level}");
        }
        assert!(EnvFilter::try_new(default_directives("ledger=loud")).is_err());
    }
}
