//! Status-endpoint wire types and the snapshot model.
//!
//! Each poll of `GET /api/generation-status` yields one [`StatusSnapshot`].
//! Snapshots are value objects: a new poll supersedes the previous snapshot
//! wholesale, and nothing here is ever mutated in place.
//!
//! The service reports progress in one of two shapes — a flat percentage or
//! nested item/type counters — which the raw response classifies into the
//! tagged [`Progress`] variant so downstream code matches on it explicitly
//! instead of probing optional fields.

use serde::{Deserialize, Serialize};

/// Opaque token binding a submission to its eventual result artifact.
///
/// Returned by job submission and (authoritatively) by the final status
/// snapshot. The client never inspects its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationKey(String);

impl CorrelationKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw response body of the status endpoint.
///
/// Every field except `isRunning` is optional; the server omits counters it
/// has no data for. Kept private to this module — callers only ever see the
/// classified [`StatusSnapshot`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawStatus {
    pub is_running: bool,
    #[serde(default)]
    pub current_item: Option<f64>,
    #[serde(default)]
    pub total_items: Option<f64>,
    #[serde(default)]
    pub current_type: Option<f64>,
    #[serde(default)]
    pub total_types: Option<f64>,
    #[serde(default)]
    pub progress_percentage: Option<f64>,
    #[serde(default)]
    pub final_correlation_key: Option<String>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub files_ready: Option<bool>,
    #[serde(default)]
    pub log: Vec<String>,
}

/// How far along the job is, in one of the two shapes the service reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// A single percentage in the server's own terms.
    Flat(f64),
    /// Item-of-N plus type-of-M counters; missing counters default to 0.
    Nested {
        current_item: f64,
        total_items: f64,
        current_type: f64,
        total_types: f64,
    },
    /// The server reported nothing usable.
    Unknown,
}

/// One point-in-time status read from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// Whether the job is still running. `false` is the success trigger.
    pub is_running: bool,
    pub progress: Progress,
    /// Definitive key for the completed artifact, when the server supplies
    /// one. Takes precedence over the key captured at submission time.
    pub final_key: Option<CorrelationKey>,
    /// Server-side phase, e.g. `starting`, `fetching_content`, `ai_generation`.
    pub phase: Option<String>,
    /// Whether result files are ready for download (server reports the
    /// inverse of `is_running`); corroboration only, never a trigger.
    pub files_ready: Option<bool>,
    /// Server-side activity log lines accumulated so far.
    pub log: Vec<String>,
}

impl From<RawStatus> for StatusSnapshot {
    fn from(raw: RawStatus) -> Self {
        // Nested counters win when totalItems is present and positive;
        // otherwise the flat percentage, if any, is used as-is.
        let progress = match raw.total_items {
            Some(total_items) if total_items > 0.0 => Progress::Nested {
                current_item: raw.current_item.unwrap_or(0.0),
                total_items,
                current_type: raw.current_type.unwrap_or(0.0),
                total_types: raw.total_types.unwrap_or(0.0),
            },
            _ => match raw.progress_percentage {
                Some(pct) => Progress::Flat(pct),
                None => Progress::Unknown,
            },
        };

        let final_key = raw
            .final_correlation_key
            .filter(|k| !k.trim().is_empty())
            .map(CorrelationKey::new);

        StatusSnapshot {
            is_running: raw.is_running,
            progress,
            final_key,
            phase: raw.phase.filter(|p| !p.is_empty()),
            files_ready: raw.files_ready,
            log: raw.log,
        }
    }
}

impl StatusSnapshot {
    /// Build a snapshot straight from a JSON body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let raw: RawStatus = serde_json::from_str(body)?;
        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_counters_classify_as_nested() {
        let snapshot = StatusSnapshot::from_json(
            r#"{"isRunning": true, "currentItem": 2, "totalItems": 4, "currentType": 1, "totalTypes": 3}"#,
        )
        .unwrap();
        assert_eq!(
            snapshot.progress,
            Progress::Nested {
                current_item: 2.0,
                total_items: 4.0,
                current_type: 1.0,
                total_types: 3.0,
            }
        );
    }

    #[test]
    fn zero_total_items_falls_back_to_flat_percentage() {
        let snapshot = StatusSnapshot::from_json(
            r#"{"isRunning": true, "totalItems": 0, "progressPercentage": 37.5}"#,
        )
        .unwrap();
        assert_eq!(snapshot.progress, Progress::Flat(37.5));
    }

    #[test]
    fn missing_counters_within_nested_default_to_zero() {
        let snapshot =
            StatusSnapshot::from_json(r#"{"isRunning": true, "totalItems": 4}"#).unwrap();
        assert_eq!(
            snapshot.progress,
            Progress::Nested {
                current_item: 0.0,
                total_items: 4.0,
                current_type: 0.0,
                total_types: 0.0,
            }
        );
    }

    #[test]
    fn no_progress_fields_classify_as_unknown() {
        let snapshot = StatusSnapshot::from_json(r#"{"isRunning": true}"#).unwrap();
        assert_eq!(snapshot.progress, Progress::Unknown);
    }

    #[test]
    fn final_key_is_captured_and_blank_keys_are_dropped() {
        let with_key = StatusSnapshot::from_json(
            r#"{"isRunning": false, "finalCorrelationKey": "abc123"}"#,
        )
        .unwrap();
        assert_eq!(with_key.final_key, Some(CorrelationKey::new("abc123")));

        let blank =
            StatusSnapshot::from_json(r#"{"isRunning": false, "finalCorrelationKey": ""}"#)
                .unwrap();
        assert_eq!(blank.final_key, None);
    }

    #[test]
    fn phase_and_log_are_carried_through() {
        let snapshot = StatusSnapshot::from_json(
            r#"{"isRunning": true, "phase": "ai_generation", "log": ["Queued", "Generating"]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.phase.as_deref(), Some("ai_generation"));
        assert_eq!(snapshot.log.len(), 2);
    }
}
