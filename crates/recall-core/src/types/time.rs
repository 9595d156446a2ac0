//! Day arithmetic on UTC timestamps.
//!
//! Intervals are fractional days; chrono durations are integral, so the
//! conversions go through milliseconds.

use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: f64 = 24.0 * 3600.0 * 1000.0;

/// Fractional days from `from` to `to` (negative if `to` is earlier).
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    to.signed_duration_since(from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Shift a timestamp by a fractional number of days.
///
/// Saturates at the representable range instead of overflowing. NaN
/// leaves `at` unchanged.
pub fn add_days(at: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    let limit = if days.is_sign_negative() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    };
    // `as` saturates; out-of-range millis fail the checked conversion
    let millis = (days * MILLIS_PER_DAY).round() as i64;
    Duration::try_milliseconds(millis)
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(limit)
}

/// Midnight (UTC) of the day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}
