use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;
use tracing::warn;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid scheduler_threads: {0}. Must be between 1 and 100")]
    InvalidThreads(usize),

    #[error("Invalid queue_backoff_limit: {0}. Must be at most 32")]
    InvalidBackoffLimit(u32),

    #[error("API endpoint cannot be empty")]
    EmptyApiEndpoint,

    #[error("Invalid http.timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid http.max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `scheduler.yaml` in the working directory (optional)
    /// 3. `SMTLAB_*` environment variables and `QUEUE_BACKOFF_LIMIT`
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("scheduler.yaml"))
            .merge(Self::prefixed_env())
            .merge(
                Env::raw()
                    .only(&["QUEUE_BACKOFF_LIMIT"])
                    .map(|_| "queue_backoff_limit".into()),
            )
            .extract()
            .context("Failed to extract configuration from figment")?;

        let config = Self::normalise(config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, with the environment
    /// still applied on top.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Self::prefixed_env())
            .merge(
                Env::raw()
                    .only(&["QUEUE_BACKOFF_LIMIT"])
                    .map(|_| "queue_backoff_limit".into()),
            )
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        let config = Self::normalise(config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// `SMTLAB_*` environment provider, with `__` separating nested
    /// keys (e.g. `SMTLAB_QUEUE__TRANSPORT`).
    ///
    /// `SMTLAB_SCHEDULER_THREADS` keeps the original deployment
    /// contract: a non-integer value falls back to the default with a
    /// warning instead of failing startup.
    fn prefixed_env() -> Env {
        let env = Env::prefixed("SMTLAB_").split("__");
        match std::env::var("SMTLAB_SCHEDULER_THREADS") {
            Ok(raw) if raw.trim().parse::<usize>().is_err() => {
                warn!(
                    value = %raw,
                    "SMTLAB_SCHEDULER_THREADS must be an integer, using default"
                );
                env.ignore(&["scheduler_threads"])
            }
            _ => env,
        }
    }

    fn normalise(mut config: Config) -> Config {
        if !config.api_endpoint.is_empty() && !config.api_endpoint.ends_with('/') {
            config.api_endpoint.push('/');
        }
        config
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.scheduler_threads == 0 || config.scheduler_threads > 100 {
            return Err(ConfigError::InvalidThreads(config.scheduler_threads));
        }

        if config.queue_backoff_limit > 32 {
            return Err(ConfigError::InvalidBackoffLimit(config.queue_backoff_limit));
        }

        if config.api_endpoint.is_empty() {
            return Err(ConfigError::EmptyApiEndpoint);
        }

        if config.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.http.timeout_secs));
        }

        if config.http.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.http.max_retries));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}
