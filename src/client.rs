//! HTTP client for the generation service.
//!
//! [`GenerationClient`] owns the two round-trips this crate makes:
//! `POST /api/generate` to submit a job and `GET /api/generation-status` to
//! read progress. Each status call is a single query — retry and cadence
//! policy live in the poll loop, never here.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::{SubmitError, TransportError};
use crate::job::JobSubmission;
use crate::status::{CorrelationKey, RawStatus, StatusSnapshot};

/// Default bound on any single HTTP call. Must stay shorter than the poll
/// interval so one slow response can never overlap the next poll.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2_000;

/// Response body of the submit endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    correlation_key: Option<String>,
    error: Option<String>,
}

/// One source of status snapshots.
///
/// The poll loop depends on this seam rather than on concrete HTTP so tests
/// can script snapshot sequences without a server.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Perform one status query. Exactly one request, no internal retry.
    async fn poll(&self) -> Result<StatusSnapshot, TransportError>;
}

/// Client for one generation service instance.
pub struct GenerationClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl GenerationClient {
    /// Create a client for the service at `base_url` (no trailing slash
    /// required; one is stripped if present).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_request_timeout(
            base_url,
            Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        )
    }

    pub fn with_request_timeout(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            request_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Results page for a finished job.
    pub fn results_url(&self, key: &CorrelationKey) -> String {
        format!("{}/results?token={}", self.base_url, key)
    }

    /// Submit a generation job.
    ///
    /// Any `error` field in the response body is a rejection regardless of
    /// HTTP status; a 2xx body with neither key nor error is treated the
    /// same way rather than invented into a success.
    pub async fn submit(&self, submission: &JobSubmission) -> Result<CorrelationKey, SubmitError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .http
            .post(&url)
            .timeout(self.request_timeout)
            .json(submission)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body: SubmitResponse = response.json().await.map_err(|e| {
            if status.is_success() {
                SubmitError::Transport(TransportError::Parse(e))
            } else {
                SubmitError::Transport(TransportError::HttpStatus {
                    status: status.as_u16(),
                })
            }
        })?;

        if let Some(error) = body.error {
            return Err(SubmitError::Rejected(error));
        }
        if !status.is_success() {
            return Err(SubmitError::Transport(TransportError::HttpStatus {
                status: status.as_u16(),
            }));
        }
        match body.correlation_key {
            Some(key) if !key.trim().is_empty() => Ok(CorrelationKey::new(key)),
            _ => Err(SubmitError::Rejected(
                "service returned neither a correlation key nor an error".to_string(),
            )),
        }
    }
}

#[async_trait]
impl StatusSource for GenerationClient {
    async fn poll(&self) -> Result<StatusSnapshot, TransportError> {
        let url = format!("{}/api/generation-status", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let raw: RawStatus = response.json().await.map_err(TransportError::Parse)?;
        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_url_appends_the_token_parameter() {
        let client = GenerationClient::new("https://cases.example.com/");
        let key = CorrelationKey::new("abc123");
        assert_eq!(
            client.results_url(&key),
            "https://cases.example.com/results?token=abc123"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = GenerationClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn submit_response_parses_key_and_error_shapes() {
        let ok: SubmitResponse =
            serde_json::from_str(r#"{"correlationKey": "k1"}"#).unwrap();
        assert_eq!(ok.correlation_key.as_deref(), Some("k1"));
        assert!(ok.error.is_none());

        let err: SubmitResponse =
            serde_json::from_str(r#"{"error": "Please select at least one test case type"}"#)
                .unwrap();
        assert!(err.correlation_key.is_none());
        assert!(err.error.is_some());
    }
}
