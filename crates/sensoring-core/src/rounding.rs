//! Rounding rules for weather buckets
//!
//! Detections are bucketed on a 0.01 degree grid (roughly 1.1 km) and to the
//! nearest whole hour. Both the cache lookup key and the stored weather record
//! use these rules, so nearby detections converge onto one record.

use chrono::{DateTime, Duration, Timelike, Utc};

/// Number of grid cells per degree (two decimal places)
pub const COORDINATE_SCALE: f64 = 100.0;

/// Round a timestamp to the nearest whole hour.
///
/// Minutes >= 30 round up to the next hour, anything below truncates.
/// Seconds and sub-second components are always discarded.
pub fn round_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = ts
        - Duration::minutes(i64::from(ts.minute()))
        - Duration::seconds(i64::from(ts.second()))
        - Duration::nanoseconds(i64::from(ts.nanosecond()));

    if ts.minute() >= 30 {
        truncated + Duration::hours(1)
    } else {
        truncated
    }
}

/// Round a coordinate to two decimal places, returned as whole hundredths.
///
/// Halves round away from zero.
pub fn round_coordinate(value: f64) -> i32 {
    (value * COORDINATE_SCALE).round() as i32
}

/// Convert whole hundredths back into degrees
pub fn coordinate_from_hundredths(hundredths: i32) -> f64 {
    f64::from(hundredths) / COORDINATE_SCALE
}
