//! Typed error hierarchy for the casegen client.
//!
//! Three failure domains map to three top-level types:
//! - `ValidationError` — bad submission fields, resolved locally before any network call
//! - `TransportError` — request/response failures on submit or status polls
//! - `SubmitError` / `PollError` — per-subsystem aggregates for the two phases of a run

use thiserror::Error;

/// A single field-level validation failure on an outbound job submission.
///
/// Validation never reaches the network: a submission with any of these is
/// rejected before `POST /api/generate` is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Which submission field failed (e.g. `caseTypes`, `config.targetUrl`).
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Network-level failures on either the submit call or a status poll.
///
/// A non-success HTTP status and a body that fails to parse are both
/// transport errors — neither is ever interpreted as "job finished".
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Status endpoint returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Failed to parse response body: {0}")]
    Parse(#[source] reqwest::Error),
}

/// Errors from job submission (validation plus the submit round-trip).
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Submission is invalid: {}", format_validation_errors(.0))]
    Invalid(Vec<ValidationError>),

    /// The service answered with an `error` field in the body. Any such
    /// field means the submission failed, regardless of HTTP status.
    #[error("Service rejected submission: {0}")]
    Rejected(String),

    #[error("A generation job is already being tracked by this process")]
    AlreadyRunning,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors that terminate a polling session.
///
/// `TimedOut` is deliberately absent here: budget exhaustion while the job
/// still reports running is a terminal *outcome*, not an error, because a
/// best-effort redirect may still be possible when a key is known.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Gave up after {consecutive} consecutive transport errors (last: {last})")]
    RetriesExhausted {
        consecutive: u32,
        #[source]
        last: TransportError,
    },

    /// The job reported completion but no correlation key could be resolved
    /// from either the final snapshot or the submission response.
    #[error("Generation finished but no result key was returned")]
    UnresolvedResult,
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_displays_field_and_message() {
        let err = ValidationError::new("caseTypes", "select at least one test case type");
        assert_eq!(
            err.to_string(),
            "caseTypes: select at least one test case type"
        );
    }

    #[test]
    fn submit_error_invalid_joins_all_fields() {
        let err = SubmitError::Invalid(vec![
            ValidationError::new("caseTypes", "empty"),
            ValidationError::new("config.targetUrl", "missing"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("caseTypes: empty"));
        assert!(msg.contains("config.targetUrl: missing"));
    }

    #[test]
    fn transport_error_http_status_carries_code() {
        let err = TransportError::HttpStatus { status: 503 };
        match &err {
            TransportError::HttpStatus { status } => assert_eq!(*status, 503),
            _ => panic!("Expected HttpStatus variant"),
        }
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn submit_error_converts_from_transport_error() {
        let inner = TransportError::HttpStatus { status: 500 };
        let err: SubmitError = inner.into();
        assert!(matches!(
            err,
            SubmitError::Transport(TransportError::HttpStatus { status: 500 })
        ));
    }

    #[test]
    fn poll_error_retries_exhausted_carries_count() {
        let err = PollError::RetriesExhausted {
            consecutive: 30,
            last: TransportError::HttpStatus { status: 502 },
        };
        match &err {
            PollError::RetriesExhausted { consecutive, .. } => assert_eq!(*consecutive, 30),
            _ => panic!("Expected RetriesExhausted"),
        }
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ValidationError::new("f", "m"));
        assert_std_error(&TransportError::HttpStatus { status: 500 });
        assert_std_error(&SubmitError::AlreadyRunning);
        assert_std_error(&PollError::UnresolvedResult);
    }
}
