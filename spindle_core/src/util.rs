//! Common time and formatting helpers for spindle_core.

/// Number of milliseconds in one minute; the tachometer window scale base.
pub const MILLIS_PER_MINUTE: u32 = 60_000;

/// Split a non-negative duration in seconds into (hours, minutes, seconds).
/// Negative inputs clamp to zero.
#[inline]
pub fn split_hms(total_secs: i64) -> (i64, i64, i64) {
    let t = total_secs.max(0);
    let hrs = t / 3600;
    let mins = (t - hrs * 3600) / 60;
    let secs = t - hrs * 3600 - mins * 60;
    (hrs, mins, secs)
}

/// Format a duration in seconds as `HH:MM:SS`, clamping negatives to zero.
pub fn format_hms(total_secs: i64) -> String {
    let (h, m, s) = split_hms(total_secs);
    format!("{h:02}:{m:02}:{s:02}")
}
