//! Shared HTTP retry policy for upstream services.
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - Other non-success statuses → fail immediately
//! - Network errors and timeouts → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Failures are mapped onto the core error taxonomy so callers can tell a
//! retryable outage from a rejected request.

use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;

use scheme_rag_core::error::{Error, Result};

/// Delay before retry number `attempt` (1-based).
pub fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt.saturating_sub(1)).min(5))
}

/// Map a non-success status and its body onto the error taxonomy.
pub fn status_error(service: &'static str, status: StatusCode, body: String) -> Error {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Error::UpstreamUnavailable {
            service,
            message: format!("HTTP {}: {}", status, body),
        }
    } else {
        Error::UpstreamRejected {
            service,
            status: status.as_u16(),
            message: body,
        }
    }
}

/// Send the request produced by `build` until it succeeds, is rejected, or
/// `max_retries` retries are used up.
pub async fn send_with_retry<F>(service: &'static str, max_retries: u32, build: F) -> Result<Response>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = backoff(attempt);
            if let Some(err) = &last_err {
                tracing::warn!(service, attempt, delay_secs = delay.as_secs(), error = %err, "retrying");
            }
            tokio::time::sleep(delay).await;
        }

        match build().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let err = status_error(service, status, body);
                if !err.is_retryable() {
                    return Err(err);
                }
                last_err = Some(err);
            }
            Err(e) => {
                last_err = Some(Error::UpstreamUnavailable {
                    service,
                    message: e.to_string(),
                });
            }
        }
    }

    Err(last_err.unwrap_or_else(|| Error::UpstreamUnavailable {
        service,
        message: "request failed after retries".to_string(),
    }))
}

/// Prefix `default_scheme://` when the host has no scheme, and drop trailing
/// slashes.
pub fn normalize_base_url(host: &str, default_scheme: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("{}://{}", default_scheme, host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        let secs: Vec<u64> = (1..=8).map(|a| backoff(a).as_secs()).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 16, 32, 32, 32]);
    }

    #[test]
    fn test_status_classification() {
        assert!(status_error("index", StatusCode::TOO_MANY_REQUESTS, String::new()).is_retryable());
        assert!(status_error("index", StatusCode::BAD_GATEWAY, String::new()).is_retryable());
        match status_error("index", StatusCode::UNAUTHORIZED, "bad key".to_string()) {
            Error::UpstreamRejected { status, message, .. } => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("idx.svc.pinecone.io/", "https"),
            "https://idx.svc.pinecone.io"
        );
        assert_eq!(normalize_base_url("localhost:11434", "http"), "http://localhost:11434");
        assert_eq!(
            normalize_base_url("https://localhost:11434", "http"),
            "https://localhost:11434"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_retryable() {
        let client = reqwest::Client::new();
        let err = send_with_retry("inference", 0, || client.get("http://127.0.0.1:1/"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
