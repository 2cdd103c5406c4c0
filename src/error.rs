//! Error types for a tracker run.
//!
//! Two layers exist:
//! - [`TrackerError`]: fatal conditions that abort the whole run.
//! - [`LookupError`]: the outcome of a single popularity lookup. Most of
//!   these downgrade to an absent score; only [`LookupError::Unauthorized`]
//!   escalates to a [`TrackerError`].
//!
//! Malformed listing entries are not errors at all: the parser logs a
//! warning and skips them.

use std::time::Duration;
use thiserror::Error;

/// Result alias for fatal run errors.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Missing or unusable credentials file, or an invalid option.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A listing page could not be retrieved.
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The streaming API rejected our credentials.
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrackerError {
    pub fn network(url: &str, message: impl ToString) -> Self {
        TrackerError::Network {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

/// Outcome of one failed popularity lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The service has no match for the release.
    #[error("no match found")]
    NotFound,

    /// HTTP 429. `retry_after` carries the server's hint when present.
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// HTTP 401/403: the token is invalid or expired.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP 5xx.
    #[error("server error: HTTP {0}")]
    Server(u16),

    /// Transport, decoding, or unexpected status failures.
    #[error("lookup failed: {0}")]
    Failed(String),
}

impl LookupError {
    /// Whether a bounded retry may turn this into a success.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LookupError::RateLimited { .. } | LookupError::Server(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LookupError::RateLimited { retry_after: None }.is_retryable());
        assert!(LookupError::Server(503).is_retryable());
        assert!(!LookupError::NotFound.is_retryable());
        assert!(!LookupError::Unauthorized("expired".into()).is_retryable());
        assert!(!LookupError::Failed("bad json".into()).is_retryable());
    }

    #[test]
    fn test_network_error_display() {
        let err = TrackerError::network("https://pitchfork.com/reviews/albums/?page=1", "HTTP 503");
        assert_eq!(
            err.to_string(),
            "Network error fetching https://pitchfork.com/reviews/albums/?page=1: HTTP 503"
        );
    }
}
