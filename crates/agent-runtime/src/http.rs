//! Shared HTTP plumbing for provider adapters
//!
//! Every transport, status and decoding failure leaves this module as a
//! [`BackendError`], so no `reqwest` error escapes the provider abstraction.

use std::time::Duration;

use agent_core::error::{AgentError, BackendError, BackendErrorKind, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

const MAX_ERROR_BODY: usize = 512;

pub(crate) fn build_client(provider: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AgentError::Config(format!("{provider} HTTP client: {e}")))
}

pub(crate) fn transport_error(provider: &str, err: &reqwest::Error) -> BackendError {
    let kind = if err.is_decode() {
        BackendErrorKind::Malformed
    } else {
        BackendErrorKind::Unavailable
    };
    BackendError::new(provider, kind, err.to_string())
}

pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> BackendError {
    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendErrorKind::Auth,
        StatusCode::TOO_MANY_REQUESTS => BackendErrorKind::RateLimited,
        s if s.is_server_error() => BackendErrorKind::Unavailable,
        _ => BackendErrorKind::Rejected,
    };
    BackendError::new(provider, kind, format!("{status}: {}", truncate(body)))
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Send a request and decode a JSON body, mapping every failure
pub(crate) async fn send_json<T: DeserializeOwned>(provider: &str, request: RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, &e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, &e))?;

    if !status.is_success() {
        tracing::warn!(provider, %status, "Backend returned an error status");
        return Err(status_error(provider, status, &body).into());
    }

    serde_json::from_str(&body).map_err(|e| {
        BackendError::new(provider, BackendErrorKind::Malformed, format!("{e}: {}", truncate(&body))).into()
    })
}

/// Probe an endpoint; any 2xx counts as healthy
pub(crate) async fn probe(provider: &str, request: RequestBuilder) -> bool {
    match request.send().await {
        Ok(response) if response.status().is_success() => true,
        Ok(response) => {
            tracing::warn!(provider, status = %response.status(), "Health check failed");
            false
        }
        Err(e) => {
            tracing::warn!(provider, error = %e, "Health check failed");
            false
        }
    }
}

/// Generate a correlation id for providers that do not issue one
pub(crate) fn generated_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_error("p", StatusCode::UNAUTHORIZED, "").kind, BackendErrorKind::Auth);
        assert_eq!(status_error("p", StatusCode::TOO_MANY_REQUESTS, "").kind, BackendErrorKind::RateLimited);
        assert_eq!(status_error("p", StatusCode::BAD_GATEWAY, "").kind, BackendErrorKind::Unavailable);
        assert_eq!(status_error("p", StatusCode::BAD_REQUEST, "").kind, BackendErrorKind::Rejected);
    }

    #[test]
    fn test_error_body_truncated() {
        let body = "x".repeat(2000);
        let err = status_error("p", StatusCode::BAD_REQUEST, &body);
        assert!(err.message.len() < 600);
    }
}
