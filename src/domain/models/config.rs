//! Configuration model.
//!
//! Loaded by `infrastructure::config::ConfigLoader` from defaults, an
//! optional YAML file, and `SMTLAB_*` environment variables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Main configuration structure for the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Base URL of the control-plane API. A trailing slash is added
    /// at load time when missing.
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Basic auth username for the control API.
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password for the control API.
    #[serde(default)]
    pub password: Option<String>,

    /// Size of the worker pool polling the scheduler queue.
    #[serde(default = "default_scheduler_threads")]
    pub scheduler_threads: usize,

    /// Cap on the empty-poll backoff exponent; the maximum idle sleep
    /// is `0.1 * 2^limit` seconds.
    #[serde(default = "default_queue_backoff_limit")]
    pub queue_backoff_limit: u32,

    /// Queue transport configuration
    #[serde(default)]
    pub queue: QueueConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_api_endpoint() -> String {
    "http://127.0.0.1:5000/".to_string()
}

const fn default_scheduler_threads() -> usize {
    1
}

const fn default_queue_backoff_limit() -> u32 {
    8
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            username: None,
            password: None,
            scheduler_threads: default_scheduler_threads(),
            queue_backoff_limit: default_queue_backoff_limit(),
            queue: QueueConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Which realisation of the message bus carries the queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueTransport {
    /// HTTP-mediated queue exposed by the control API at
    /// `queues/{name}`.
    Http,
    /// Redis list-backed message bus.
    Redis,
    /// In-process queue; tests and single-process runs only.
    Memory,
}

impl FromStr for QueueTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "unknown queue transport '{other}', expected one of: http, redis, memory"
            )),
        }
    }
}

impl fmt::Display for QueueTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Http => "http",
            Self::Redis => "redis",
            Self::Memory => "memory",
        };
        f.write_str(name)
    }
}

/// Queue transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueueConfig {
    /// Transport realisation behind the queue client.
    #[serde(default = "default_queue_transport")]
    pub transport: QueueTransport,

    /// Redis connection URL; only used by the redis transport.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Long-poll wait per receive, in seconds.
    #[serde(default = "default_poll_wait_secs")]
    pub poll_wait_secs: u64,
}

const fn default_queue_transport() -> QueueTransport {
    QueueTransport::Http
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

const fn default_poll_wait_secs() -> u64 {
    5
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            transport: default_queue_transport(),
            redis_url: default_redis_url(),
            poll_wait_secs: default_poll_wait_secs(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures; the first request is
    /// not counted.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Exponential backoff factor in milliseconds. With the default
    /// of 1000 the retry delays are 0, 2, 4, 8 and 16 seconds.
    #[serde(default = "default_backoff_factor_ms")]
    pub backoff_factor_ms: u64,
}

const fn default_timeout_secs() -> u64 {
    5
}

const fn default_max_retries() -> u32 {
    5
}

const fn default_backoff_factor_ms() -> u64 {
    1000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_factor_ms: default_backoff_factor_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for daily-rotated JSON log files.
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
