//! Common time helpers for shot_core.

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: f64 = 1_000.0;

/// Convert a millisecond quantity (a delay or a timestamp delta) to seconds.
#[inline]
pub fn ms_to_secs(ms: f64) -> f64 {
    ms / MILLIS_PER_SEC
}

/// Seconds elapsed between two sample timestamps (`to - from`).
///
/// Negative when the samples are out of order; callers that integrate over
/// time skip non-positive intervals.
#[inline]
pub fn elapsed_secs(from_ms: i64, to_ms: i64) -> f64 {
    ms_to_secs(to_ms.saturating_sub(from_ms) as f64)
}
