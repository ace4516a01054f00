//! Infrastructure layer
//!
//! Adapters for the scheduler's external collaborators:
//! - Control API HTTP client (reqwest)
//! - Queue transports (control API HTTP queues, Redis, in-memory)
//! - Configuration loading (figment)
//! - Logging setup (tracing)

pub mod api;
pub mod config;
pub mod logging;
pub mod queue;
