//! Pure progress computation: snapshot in, percentage out.
//!
//! No I/O and no state. The nested formula treats each completed item as its
//! full share of 100%, plus the current item's partial share from its
//! type-of-M sub-steps:
//!
//! ```text
//! item = (current_item / total_items) * 100
//! type = total_types > 0 ? (current_type / total_types) * (100 / total_items) : 0
//! ```
//!
//! The result is always clamped to [0, 100]. Inputs are not guaranteed to be
//! monotonic across polls; callers display the latest value as-is.

use crate::status::{Progress, StatusSnapshot};

/// A percentage clamped to [0, 100].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressValue(f64);

impl ProgressValue {
    pub const ZERO: ProgressValue = ProgressValue(0.0);
    pub const COMPLETE: ProgressValue = ProgressValue(100.0);

    /// Clamp an arbitrary float into the displayable range. Non-finite
    /// input collapses to 0 rather than poisoning the gauge.
    pub fn clamped(raw: f64) -> Self {
        if raw.is_finite() {
            Self(raw.clamp(0.0, 100.0))
        } else {
            Self(0.0)
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// Whole-number percentage for text display.
    pub fn rounded(&self) -> u64 {
        self.0.round() as u64
    }
}

impl std::fmt::Display for ProgressValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.rounded())
    }
}

/// Compute the display percentage for one snapshot.
pub fn percent_of(snapshot: &StatusSnapshot) -> ProgressValue {
    let raw = match snapshot.progress {
        Progress::Nested {
            current_item,
            total_items,
            current_type,
            total_types,
        } => {
            // total_items > 0 is guaranteed by snapshot classification.
            let item = (current_item / total_items) * 100.0;
            let per_type = if total_types > 0.0 {
                (current_type / total_types) * (100.0 / total_items)
            } else {
                0.0
            };
            item + per_type
        }
        Progress::Flat(pct) => pct,
        Progress::Unknown => 0.0,
    };
    ProgressValue::clamped(raw)
}

/// Human-readable label for the current snapshot: the server phase when one
/// is reported, otherwise a generic running/finished message.
pub fn label_of(snapshot: &StatusSnapshot) -> String {
    match snapshot.phase.as_deref() {
        Some("starting") => "Starting generation".to_string(),
        Some("fetching_content") => "Fetching source content".to_string(),
        Some("ai_generation") => "Generating test cases".to_string(),
        Some("completed") => "Generation complete".to_string(),
        Some("error") => "Generation error reported".to_string(),
        Some(other) => other.replace('_', " "),
        None if snapshot.is_running => "Generating".to_string(),
        None => "Finishing up".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::CorrelationKey;

    fn snapshot(progress: Progress) -> StatusSnapshot {
        StatusSnapshot {
            is_running: true,
            progress,
            final_key: None,
            phase: None,
            files_ready: None,
            log: Vec::new(),
        }
    }

    fn nested(current_item: f64, total_items: f64, current_type: f64, total_types: f64) -> StatusSnapshot {
        snapshot(Progress::Nested {
            current_item,
            total_items,
            current_type,
            total_types,
        })
    }

    #[test]
    fn nested_counters_follow_the_item_plus_type_formula() {
        // 2 of 4 items done, 1 of 3 types into the current item:
        // 50 + (1/3) * 25 = 58.33...
        let value = percent_of(&nested(2.0, 4.0, 1.0, 3.0));
        assert!((value.as_f64() - 58.333).abs() < 0.01);
    }

    #[test]
    fn flat_percentage_is_used_directly() {
        let value = percent_of(&snapshot(Progress::Flat(37.5)));
        assert_eq!(value.as_f64(), 37.5);
    }

    #[test]
    fn unknown_progress_is_zero() {
        assert_eq!(percent_of(&snapshot(Progress::Unknown)), ProgressValue::ZERO);
    }

    #[test]
    fn output_is_clamped_to_the_displayable_range() {
        assert_eq!(percent_of(&snapshot(Progress::Flat(250.0))).as_f64(), 100.0);
        assert_eq!(percent_of(&snapshot(Progress::Flat(-10.0))).as_f64(), 0.0);
        // Overshooting counters clamp too.
        assert_eq!(percent_of(&nested(9.0, 4.0, 1.0, 3.0)).as_f64(), 100.0);
    }

    #[test]
    fn zero_total_types_contributes_nothing() {
        let value = percent_of(&nested(2.0, 4.0, 1.0, 0.0));
        assert_eq!(value.as_f64(), 50.0);
    }

    #[test]
    fn non_finite_flat_percentage_collapses_to_zero() {
        assert_eq!(percent_of(&snapshot(Progress::Flat(f64::NAN))).as_f64(), 0.0);
        assert_eq!(
            percent_of(&snapshot(Progress::Flat(f64::INFINITY))).as_f64(),
            100.0
        );
    }

    // Known quirk, preserved deliberately: mid-way through the last item the
    // formula cannot reach 100, and the server does not always send a final
    // all-counters-maxed snapshot before flipping is_running off. The loop
    // forces the display to 100% on the success transition instead of the
    // formula being "fixed" to guarantee it.
    #[test]
    fn nested_progress_on_the_last_item_stays_short_of_100() {
        let last_item_mid_type = percent_of(&nested(3.0, 4.0, 2.0, 3.0));
        assert!(last_item_mid_type.as_f64() < 100.0);
        // Only a fully-maxed final snapshot lands exactly on 100.
        assert_eq!(percent_of(&nested(3.0, 4.0, 3.0, 3.0)).as_f64(), 100.0);
    }

    #[test]
    fn label_prefers_the_server_phase() {
        let mut snap = snapshot(Progress::Unknown);
        snap.phase = Some("ai_generation".to_string());
        assert_eq!(label_of(&snap), "Generating test cases");

        snap.phase = Some("custom_phase".to_string());
        assert_eq!(label_of(&snap), "custom phase");

        snap.phase = None;
        assert_eq!(label_of(&snap), "Generating");

        snap.is_running = false;
        snap.final_key = Some(CorrelationKey::new("k"));
        assert_eq!(label_of(&snap), "Finishing up");
    }

    #[test]
    fn progress_value_display_rounds_to_whole_percent() {
        assert_eq!(ProgressValue::clamped(58.333).to_string(), "58%");
        assert_eq!(ProgressValue::COMPLETE.to_string(), "100%");
    }
}
