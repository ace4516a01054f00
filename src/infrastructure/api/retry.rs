/// Retry policy with exponential backoff for control API requests
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use super::error::ApiError;

/// Retry policy with exponential backoff.
///
/// Transient errors (429, 500, 502, 503, 504, network) are re-issued
/// up to `max_retries` times after the initial attempt. The delay
/// before retry `n` is `factor * 2^(n-1)`, except that the first
/// retry fires immediately; with the default 1 s factor the schedule
/// is 0, 2, 4, 8, 16 s. Permanent errors propagate on first sight.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_factor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_factor: Duration) -> Self {
        Self {
            max_retries,
            backoff_factor,
        }
    }

    /// Execute an async operation, retrying transient failures.
    ///
    /// On an exhausted budget the last error is wrapped in
    /// [`ApiError::RetriesExhausted`] so callers can surface it
    /// without retrying again.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut failures = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_transient() {
                        return Err(err);
                    }

                    failures += 1;
                    if failures > self.max_retries {
                        return Err(ApiError::RetriesExhausted {
                            attempts: failures,
                            source: Box::new(err),
                        });
                    }

                    let backoff = self.backoff(failures);
                    warn!(
                        retry = failures,
                        max_retries = self.max_retries,
                        delay_ms = backoff.as_millis() as u64,
                        error = %err,
                        "transient control API error, retrying"
                    );
                    if !backoff.is_zero() {
                        sleep(backoff).await;
                    }
                }
            }
        }
    }

    /// Delay before the given retry (1-indexed).
    fn backoff(&self, retry: u32) -> Duration {
        if retry <= 1 {
            Duration::ZERO
        } else {
            self.backoff_factor
                .saturating_mul(2u32.saturating_pow(retry - 1))
        }
    }
}
