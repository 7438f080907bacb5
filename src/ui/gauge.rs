//! Circular gauge geometry.
//!
//! Maps a progress percentage onto the stroke offset of an SVG-style circle:
//! the gauge draws `circumference − offset` worth of arc, so 0% leaves the
//! ring empty and 100% closes it. Pure arithmetic; rendering lives with the
//! embedding page or widget.

use crate::progress::ProgressValue;

/// Radius used by the stock results widget.
pub const DEFAULT_RADIUS: f64 = 54.0;

/// One circular gauge of a fixed radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gauge {
    radius: f64,
}

impl Default for Gauge {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS)
    }
}

impl Gauge {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    pub fn circumference(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.radius
    }

    /// Stroke dash offset for a progress value:
    /// `offset = circumference − (percent / 100) × circumference`.
    pub fn stroke_offset(&self, value: ProgressValue) -> f64 {
        let circumference = self.circumference();
        circumference - (value.as_f64() / 100.0) * circumference
    }

    /// The gauge hides itself entirely at 0 and shows at any value above it.
    pub fn is_visible(&self, value: ProgressValue) -> bool {
        value.as_f64() > 0.0
    }
}
