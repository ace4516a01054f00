//! Logging setup using tracing.

use anyhow::{anyhow, Result};
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Keeps the non-blocking file writer alive for the process lifetime.
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Initialise the global subscriber from the logging configuration.
///
/// Stdout gets the configured format; when `log_dir` is set a
/// daily-rotated JSON file layer is added. `RUST_LOG` still overrides
/// the configured default level.
pub fn init(config: &crate::domain::models::LoggingConfig) -> Result<LogGuard> {
    let default_level = parse_log_level(&config.level)?;
    let filter = || {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    };

    let guard = if let Some(ref log_dir) = config.log_dir {
        let file_appender = rolling::daily(log_dir, "scheduler.log");
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking_file)
            .with_ansi(false)
            .with_target(true)
            .with_filter(filter());

        if config.format == "json" {
            let stdout_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stdout)
                .with_target(true)
                .with_filter(filter());
            tracing_subscriber::registry()
                .with(file_layer)
                .with(stdout_layer)
                .init();
        } else {
            let stdout_layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stdout)
                .with_target(true)
                .with_filter(filter());
            tracing_subscriber::registry()
                .with(file_layer)
                .with(stdout_layer)
                .init();
        }

        Some(guard)
    } else {
        if config.format == "json" {
            let stdout_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stdout)
                .with_target(true)
                .with_filter(filter());
            tracing_subscriber::registry().with(stdout_layer).init();
        } else {
            let stdout_layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stdout)
                .with_target(true)
                .with_filter(filter());
            tracing_subscriber::registry().with(stdout_layer).init();
        }
        None
    };

    Ok(LogGuard { _guard: guard })
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(anyhow!("invalid log level: {other}")),
    }
}
