//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - programmatic defaults
//! - optional `scheduler.yaml` in the working directory
//! - `SMTLAB_*` environment variables (plus `QUEUE_BACKOFF_LIMIT`)

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
