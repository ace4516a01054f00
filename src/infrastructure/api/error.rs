/// Error types for control API client operations
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling the control-plane API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rate limited (429); retried.
    #[error("rate limited by the control API")]
    RateLimited,

    /// Transient server-side error (500, 502, 503, 504); retried.
    #[error("control API server error ({status}): {body}")]
    Server { status: StatusCode, body: String },

    /// Any other non-2xx response; raised immediately.
    #[error("control API rejected the request ({status}): {body}")]
    Remote { status: StatusCode, body: String },

    /// Connection failed, timed out, or the transport broke mid-flight;
    /// retried.
    #[error("network error talking to the control API: {0}")]
    Network(String),

    /// The response body did not decode into the expected shape.
    #[error("failed to decode control API response: {0}")]
    Decode(String),

    /// The retry budget ran out. Callers surface this but never retry
    /// it themselves.
    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// Classify a non-2xx response.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            429 => Self::RateLimited,
            500 | 502 | 503 | 504 => Self::Server { status, body },
            _ => Self::Remote { status, body },
        }
    }

    /// Whether the retry policy may re-issue the request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Server { .. } | Self::Network(_)
        )
    }
}
