//! Submission controller: validate, submit, then hand off to the poll loop.
//!
//! [`GenerationEngine`] owns the process-wide active flag and is the only
//! place that starts poll sessions, which is what makes the at-most-one
//! invariant hold across the whole process.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::client::GenerationClient;
use crate::errors::SubmitError;
use crate::job::JobSubmission;
use crate::poll::{PollConfig, PollLoop, PollSession, ProgressSink, SessionGuard, SessionReport};
use crate::status::CorrelationKey;

/// Front door for one generation service: submit jobs and track them.
pub struct GenerationEngine {
    client: GenerationClient,
    poll_config: PollConfig,
    active: Arc<AtomicBool>,
}

impl GenerationEngine {
    pub fn new(client: GenerationClient, poll_config: PollConfig) -> Self {
        Self {
            client,
            poll_config,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Validate and submit `submission`, then poll the job to its terminal
    /// state, driving `sink` along the way.
    ///
    /// Rejected outright (no network call) when validation fails or another
    /// session is already active. The guard is taken *before* the submit
    /// round-trip so two callers cannot race one job slot, and is released
    /// on every exit, including a failed submit.
    pub async fn generate(
        &self,
        submission: &JobSubmission,
        sink: &mut dyn ProgressSink,
    ) -> Result<SessionReport, SubmitError> {
        submission.validate().map_err(SubmitError::Invalid)?;

        let guard = SessionGuard::acquire(&self.active).ok_or(SubmitError::AlreadyRunning)?;

        tracing::info!(
            source = %submission.source.kind(),
            case_types = submission.case_types.len(),
            "submitting generation job"
        );
        let key = self.client.submit(submission).await?;
        tracing::info!(key = %key, "job submitted");

        let session = PollSession::new(guard, Some(key));
        let report = PollLoop::new(&self.client, self.poll_config.clone())
            .run(session, sink)
            .await;
        Ok(report)
    }

    /// Attach to a job this process did not submit (the service tracks one
    /// job at a time, so no key is needed to watch it). The session has no
    /// submission-time key; resolution relies on the final snapshot alone.
    pub async fn watch(&self, sink: &mut dyn ProgressSink) -> Result<SessionReport, SubmitError> {
        let guard = SessionGuard::acquire(&self.active).ok_or(SubmitError::AlreadyRunning)?;
        let session = PollSession::new(guard, None);
        let report = PollLoop::new(&self.client, self.poll_config.clone())
            .run(session, sink)
            .await;
        Ok(report)
    }

    /// Results page for a finished job.
    pub fn results_url(&self, key: &CorrelationKey) -> String {
        self.client.results_url(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::SourceConfig;
    use crate::poll::Severity;
    use crate::progress::ProgressValue;
    use std::sync::atomic::Ordering;

    #[derive(Default)]
    struct NullSink;

    impl ProgressSink for NullSink {
        fn on_progress(&mut self, _value: ProgressValue, _label: &str) {}
        fn notify(&mut self, _severity: Severity, _message: &str) {}
    }

    fn engine() -> GenerationEngine {
        // Port 9 is discard; nothing listens there in tests. Paths that hit
        // the network fail fast with connection refused.
        GenerationEngine::new(
            GenerationClient::new("http://127.0.0.1:9"),
            PollConfig::default(),
        )
    }

    fn valid_submission() -> JobSubmission {
        JobSubmission::new(
            SourceConfig::Url {
                target_url: "https://example.com".to_string(),
            },
            vec!["functional".to_string()],
        )
    }

    #[tokio::test]
    async fn invalid_submission_is_rejected_before_any_network_call() {
        let engine = engine();
        let submission = JobSubmission::new(
            SourceConfig::Url {
                target_url: "https://example.com".to_string(),
            },
            vec![],
        );

        let err = engine
            .generate(&submission, &mut NullSink)
            .await
            .unwrap_err();
        match err {
            SubmitError::Invalid(errors) => assert_eq!(errors[0].field, "testCaseTypes"),
            other => panic!("Expected Invalid, got {other:?}"),
        }
        // No guard was ever taken.
        assert!(!engine.active.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn a_second_session_is_rejected_while_one_is_active() {
        let engine = engine();
        let _held = SessionGuard::acquire(&engine.active).unwrap();

        let err = engine
            .generate(&valid_submission(), &mut NullSink)
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::AlreadyRunning));
    }

    #[tokio::test]
    async fn a_failed_submit_releases_the_guard() {
        let engine = engine();
        let err = engine
            .generate(&valid_submission(), &mut NullSink)
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Transport(_)));
        assert!(!engine.active.load(Ordering::Acquire));
        // The slot is usable again.
        assert!(SessionGuard::acquire(&engine.active).is_some());
    }

    #[test]
    fn results_url_delegates_to_the_client() {
        let engine = engine();
        let key = CorrelationKey::new("abc");
        assert_eq!(
            engine.results_url(&key),
            "http://127.0.0.1:9/results?token=abc"
        );
    }
}
