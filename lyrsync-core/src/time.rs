//! Time and duration conversion utilities.
//!
//! Playback positions are unsigned [`Duration`]s but lyrics timing offsets are
//! signed milliseconds, so line comparisons go through a signed conversion
//! with explicit saturation behavior.

use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as i64, saturating at `i64::MAX`.
    ///
    /// In practice, this is always safe because durations exceeding `i64::MAX`
    /// milliseconds would represent ~292 million years.
    fn as_millis_i64(&self) -> i64;
}

impl DurationExt for Duration {
    fn as_millis_i64(&self) -> i64 {
        i64::try_from(self.as_millis()).unwrap_or(i64::MAX)
    }
}
