//! The polling state machine.
//!
//! One [`PollSession`] tracks one generation job from submission to a
//! terminal outcome: `Idle → Polling → {Succeeded, TimedOut, Failed}`. The
//! non-terminal states are encoded in control flow — the loop issues one
//! status query, waits for its resolution, and only then schedules the next,
//! so there is never more than one outstanding request and snapshots are
//! consumed strictly in request order.
//!
//! Mutual exclusion: at most one session may be active per process. The
//! active flag is not ambient global state — it is owned by the session as a
//! [`SessionGuard`] whose `Drop` releases it exactly once, on every terminal
//! path including failures.
//!
//! All delays go through `tokio::time::sleep`, so tests drive the loop under
//! `#[tokio::test(start_paused = true)]` without real wall-clock waits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::client::StatusSource;
use crate::errors::PollError;
use crate::progress::{ProgressValue, label_of, percent_of};
use crate::status::CorrelationKey;

/// Baseline delay between healthy polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

/// Longer fixed delay after a transport error. Deliberately not exponential.
pub const DEFAULT_ERROR_RETRY_INTERVAL_MS: u64 = 5_000;

/// Total poll budget across healthy and error polls alike. At the baseline
/// interval this bounds a session to roughly twelve minutes.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 240;

/// Consecutive transport errors tolerated before giving up entirely.
pub const DEFAULT_MAX_ERROR_RETRIES: u32 = 30;

/// Short hold at 100% so completion is perceptible before the redirect.
pub const DEFAULT_COMPLETION_HOLD_MS: u64 = 500;

/// Cadence and budget settings for one polling session.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between polls while snapshots arrive successfully.
    pub poll_interval: Duration,
    /// Delay before the next poll after a transport error.
    pub error_retry_interval: Duration,
    /// Upper bound on total polls; exhaustion while the job still reports
    /// running is the `TimedOut` transition.
    pub max_attempts: u32,
    /// Upper bound on *consecutive* transport errors; exhaustion is the
    /// `Failed` transition.
    pub max_error_retries: u32,
    /// Pause at forced 100% before the success transition.
    pub completion_hold: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            error_retry_interval: Duration::from_millis(DEFAULT_ERROR_RETRY_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_error_retries: DEFAULT_MAX_ERROR_RETRIES,
            completion_hold: Duration::from_millis(DEFAULT_COMPLETION_HOLD_MS),
        }
    }
}

impl PollConfig {
    /// Set the baseline poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the post-error retry interval.
    pub fn with_error_retry_interval(mut self, interval: Duration) -> Self {
        self.error_retry_interval = interval;
        self
    }

    /// Set the total attempt budget.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the consecutive-error budget.
    pub fn with_max_error_retries(mut self, retries: u32) -> Self {
        self.max_error_retries = retries;
        self
    }

    /// Set the completion hold.
    pub fn with_completion_hold(mut self, hold: Duration) -> Self {
        self.completion_hold = hold;
        self
    }
}

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Rendering seam driven by the loop. Implementations draw; they never poll.
pub trait ProgressSink: Send {
    /// Latest progress value and label. Values are not guaranteed monotonic.
    fn on_progress(&mut self, value: ProgressValue, label: &str);

    /// Exactly one of these arrives per session, on the terminal transition
    /// (validation errors are reported through the same channel before a
    /// session exists).
    fn notify(&mut self, severity: Severity, message: &str);

    /// A server-side activity log line not seen before. Default: ignored.
    fn on_log(&mut self, _line: &str) {}
}

/// Terminal outcome of one session.
#[derive(Debug)]
pub enum Outcome {
    /// The job finished and a correlation key was resolved.
    Succeeded { key: CorrelationKey },
    /// The attempt budget ran out while the job still reported running.
    /// `key` enables a best-effort redirect when one was ever observed.
    TimedOut { key: Option<CorrelationKey> },
    Failed(PollError),
}

impl Outcome {
    /// Key to redirect with, when any is available.
    pub fn redirect_key(&self) -> Option<&CorrelationKey> {
        match self {
            Outcome::Succeeded { key } => Some(key),
            Outcome::TimedOut { key } => key.as_ref(),
            Outcome::Failed(_) => None,
        }
    }
}

/// Summary of a finished session.
#[derive(Debug)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Polls actually performed, both healthy and error.
    pub attempts: u32,
    pub outcome: Outcome,
}

/// Owned handle on the process-wide "a job is being tracked" flag.
///
/// Acquired at session start, released by `Drop` — ownership makes the
/// exactly-once release structural rather than a discipline.
pub struct SessionGuard {
    flag: Arc<AtomicBool>,
}

impl SessionGuard {
    /// Try to take the flag. `None` means another session is active and the
    /// caller must be rejected, not queued.
    pub fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: Arc::clone(flag) })
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Live state of one polling session.
pub struct PollSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    /// Key captured at submission time; `None` when attaching to a job this
    /// process did not submit.
    submitted_key: Option<CorrelationKey>,
    attempts: u32,
    consecutive_errors: u32,
    /// Count of server log lines already forwarded to the sink.
    forwarded_log_lines: usize,
    /// Held for the session lifetime; released by drop on every terminal path.
    _guard: SessionGuard,
}

impl PollSession {
    /// Build a session around an already-acquired guard. Used when the
    /// guard must be held across the submit call that produces the key.
    pub fn new(guard: SessionGuard, submitted_key: Option<CorrelationKey>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            submitted_key,
            attempts: 0,
            consecutive_errors: 0,
            forwarded_log_lines: 0,
            _guard: guard,
        }
    }

    /// Start a session, taking the process-wide flag. `None` when a session
    /// is already active.
    pub fn begin(flag: &Arc<AtomicBool>, submitted_key: Option<CorrelationKey>) -> Option<Self> {
        SessionGuard::acquire(flag).map(|guard| Self::new(guard, submitted_key))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// The polling loop itself: cadence, budgets, and terminal transitions.
pub struct PollLoop<'a> {
    source: &'a dyn StatusSource,
    config: PollConfig,
}

impl<'a> PollLoop<'a> {
    pub fn new(source: &'a dyn StatusSource, config: PollConfig) -> Self {
        Self { source, config }
    }

    /// Drive `session` to its terminal state.
    ///
    /// Consumes the session; its guard is released when this returns, on
    /// every path. Emits exactly one terminal notification through `sink`.
    pub async fn run(&self, mut session: PollSession, sink: &mut dyn ProgressSink) -> SessionReport {
        let mut last_final_key: Option<CorrelationKey> = None;
        let mut last_error = None;

        let outcome = loop {
            if session.attempts >= self.config.max_attempts {
                if session.consecutive_errors > 0 {
                    // The budget ran out inside an unbroken error streak.
                    break self.fail_on_errors(&session, last_error.take(), sink);
                }
                break self.time_out(&session, last_final_key.take(), sink);
            }
            session.attempts += 1;

            match self.source.poll().await {
                Ok(snapshot) => {
                    session.consecutive_errors = 0;
                    last_error = None;
                    if snapshot.final_key.is_some() {
                        last_final_key = snapshot.final_key.clone();
                    }
                    for line in snapshot.log.iter().skip(session.forwarded_log_lines) {
                        sink.on_log(line);
                    }
                    session.forwarded_log_lines =
                        session.forwarded_log_lines.max(snapshot.log.len());

                    if !snapshot.is_running {
                        tracing::debug!(
                            session = %session.id,
                            attempts = session.attempts,
                            files_ready = ?snapshot.files_ready,
                            "job reports completion"
                        );
                        break self
                            .succeed(&session, last_final_key.take(), sink)
                            .await;
                    }

                    let value = percent_of(&snapshot);
                    sink.on_progress(value, &label_of(&snapshot));
                    tracing::debug!(
                        session = %session.id,
                        attempt = session.attempts,
                        percent = value.as_f64(),
                        phase = snapshot.phase.as_deref().unwrap_or(""),
                        "job still running"
                    );
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Err(err) => {
                    session.consecutive_errors += 1;
                    tracing::warn!(
                        session = %session.id,
                        attempt = session.attempts,
                        consecutive = session.consecutive_errors,
                        error = %err,
                        "status poll failed"
                    );
                    last_error = Some(err);
                    if session.consecutive_errors >= self.config.max_error_retries {
                        break self.fail_on_errors(&session, last_error.take(), sink);
                    }
                    tokio::time::sleep(self.config.error_retry_interval).await;
                }
            }
        };

        SessionReport {
            session_id: session.id,
            started_at: session.started_at,
            finished_at: Utc::now(),
            attempts: session.attempts,
            outcome,
        }
        // `session` (and with it the guard) drops here.
    }

    /// Success transition: force 100%, hold briefly, resolve the definitive
    /// key. A completed job with no resolvable key is a failure, not a
    /// silent success.
    async fn succeed(
        &self,
        session: &PollSession,
        final_key: Option<CorrelationKey>,
        sink: &mut dyn ProgressSink,
    ) -> Outcome {
        sink.on_progress(ProgressValue::COMPLETE, "Generation complete");
        tokio::time::sleep(self.config.completion_hold).await;

        // The final snapshot's key takes precedence over the one captured
        // at submission time.
        match final_key.or_else(|| session.submitted_key.clone()) {
            Some(key) => {
                tracing::info!(session = %session.id, key = %key, "generation succeeded");
                sink.notify(Severity::Info, "Test case generation complete");
                Outcome::Succeeded { key }
            }
            None => {
                tracing::error!(session = %session.id, "completed without a correlation key");
                sink.notify(
                    Severity::Error,
                    "Generation finished but no result key was returned",
                );
                Outcome::Failed(PollError::UnresolvedResult)
            }
        }
    }

    fn time_out(
        &self,
        session: &PollSession,
        key: Option<CorrelationKey>,
        sink: &mut dyn ProgressSink,
    ) -> Outcome {
        tracing::warn!(
            session = %session.id,
            attempts = session.attempts,
            "gave up waiting for generation to finish"
        );
        sink.notify(
            Severity::Warning,
            "Generation is taking longer than expected; showing the latest available results",
        );
        Outcome::TimedOut {
            key: key.or_else(|| session.submitted_key.clone()),
        }
    }

    fn fail_on_errors(
        &self,
        session: &PollSession,
        last_error: Option<crate::errors::TransportError>,
        sink: &mut dyn ProgressSink,
    ) -> Outcome {
        let error = PollError::RetriesExhausted {
            consecutive: session.consecutive_errors,
            last: last_error.unwrap_or(crate::errors::TransportError::HttpStatus { status: 0 }),
        };
        tracing::error!(session = %session.id, error = %error, "polling failed");
        sink.notify(
            Severity::Error,
            "Lost contact with the generation service; please try again",
        );
        Outcome::Failed(error)
    }
}
