//! Property tests for the bucket rounding rules

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use proptest::prelude::*;
use sensoring_core::models::{BucketKey, Location};
use sensoring_core::rounding::{round_coordinate, round_to_hour};

fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    // 2020-01-01 .. 2030-01-01, second resolution
    (1_577_836_800i64..1_893_456_000i64)
        .prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
}

proptest! {
    #[test]
    fn prop_rounded_hour_is_whole(ts in timestamp()) {
        let rounded = round_to_hour(ts);
        prop_assert_eq!(rounded.minute(), 0);
        prop_assert_eq!(rounded.second(), 0);
        prop_assert_eq!(rounded.nanosecond(), 0);
    }

    #[test]
    fn prop_rounding_direction_follows_minute(ts in timestamp()) {
        let rounded = round_to_hour(ts);
        if ts.minute() < 30 {
            prop_assert!(rounded <= ts);
            prop_assert!(ts - rounded < Duration::minutes(30));
        } else {
            prop_assert!(rounded > ts);
            prop_assert!(rounded - ts <= Duration::minutes(30));
        }
    }

    #[test]
    fn prop_rounding_is_idempotent(ts in timestamp()) {
        let once = round_to_hour(ts);
        prop_assert_eq!(round_to_hour(once), once);
    }

    #[test]
    fn prop_coordinate_within_half_cell(value in -180.0f64..180.0) {
        let hundredths = round_coordinate(value);
        prop_assert!((f64::from(hundredths) / 100.0 - value).abs() <= 0.005 + 1e-9);
    }

    #[test]
    fn prop_rounded_location_keeps_bucket(
        lat in -90.0f64..90.0,
        lon in -180.0f64..180.0,
        ts in timestamp(),
    ) {
        let location = Location::new(lat, lon);
        let key = BucketKey::new(location, ts);
        prop_assert_eq!(BucketKey::new(location.rounded(), key.hour), key);
    }
}
