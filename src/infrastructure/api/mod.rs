//! Control API client infrastructure.
//!
//! Authenticated, retrying HTTP client for the SMTLab control-plane
//! API:
//! - Basic auth on every request
//! - Error classification (transient vs permanent)
//! - Exponential backoff retry for transient errors
//! - Raw access to the HTTP-mediated queues

pub mod client;
pub mod error;
pub mod retry;

pub use client::SmtlabClient;
pub use error::ApiError;
pub use retry::RetryPolicy;
