//! Error taxonomy for the core pipeline and its gateway seams.
//!
//! "No relevant context" is deliberately absent: an empty retrieval is a
//! normal outcome and is represented by an empty hit list.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A raw record could not be turned into a flat map (wrong shape or
    /// nested beyond the depth guard).
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// An upsert was attempted with more records than the index accepts per call.
    #[error("batch of {size} records exceeds the upsert limit of {limit}")]
    BatchLimitExceeded { size: usize, limit: usize },

    /// Transient upstream failure (network, timeout, 429, 5xx). Safe to retry.
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable {
        service: &'static str,
        message: String,
    },

    /// The upstream answered with a client error. Retrying will not help.
    #[error("{service} rejected the request (HTTP {status}): {message}")]
    UpstreamRejected {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("tokenizer error: {0}")]
    Tokenizer(String),
}

impl Error {
    /// Whether the same call may succeed if repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::UpstreamUnavailable { .. })
    }

    /// Whether the failure came from the index or inference boundary.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::UpstreamUnavailable { .. } | Error::UpstreamRejected { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let transient = Error::UpstreamUnavailable {
            service: "index",
            message: "timeout".to_string(),
        };
        let rejected = Error::UpstreamRejected {
            service: "index",
            status: 400,
            message: "bad namespace".to_string(),
        };
        assert!(transient.is_retryable());
        assert!(transient.is_upstream());
        assert!(!rejected.is_retryable());
        assert!(rejected.is_upstream());
        assert!(!Error::MalformedInput("x".to_string()).is_upstream());
    }

    #[test]
    fn test_batch_limit_message() {
        let err = Error::BatchLimitExceeded {
            size: 120,
            limit: 96,
        };
        assert_eq!(
            err.to_string(),
            "batch of 120 records exceeds the upsert limit of 96"
        );
    }
}
