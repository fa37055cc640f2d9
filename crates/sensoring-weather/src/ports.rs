//! Weather lookup port

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sensoring_core::models::WeatherCondition;
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// One hourly observation from the upstream weather service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyObservation {
    pub time: DateTime<Utc>,
    /// Air temperature at 2 m, degrees Celsius
    pub temperature: f64,
    /// WMO weather code
    pub condition_code: i32,
}

impl HourlyObservation {
    pub fn new(time: DateTime<Utc>, temperature: f64, condition_code: i32) -> Self {
        Self { time, temperature, condition_code }
    }

    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.condition_code)
    }
}

/// Port for fetching hourly weather
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Fetch every hourly observation for one calendar day (UTC)
    ///
    /// # Returns
    /// The observations in upstream order; empty when upstream has no data
    async fn fetch_hourly(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<Vec<HourlyObservation>, WeatherError>;

    /// Observation closest in time to `at`, taken from that day's series
    async fn observation_at(
        &self,
        latitude: f64,
        longitude: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<HourlyObservation>, WeatherError> {
        let observations = self.fetch_hourly(latitude, longitude, at.date_naive()).await?;
        Ok(closest_observation(&observations, at).cloned())
    }

    /// Name of the upstream, for logging
    fn name(&self) -> &str;
}

/// Index of the time nearest to `target`.
///
/// Ties resolve to the lowest index. Returns `None` for an empty slice.
pub fn closest_index(times: &[DateTime<Utc>], target: DateTime<Utc>) -> Option<usize> {
    let mut best: Option<(usize, Duration)> = None;

    for (i, time) in times.iter().enumerate() {
        let diff = if *time >= target { *time - target } else { target - *time };
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((i, diff)),
        }
    }

    best.map(|(i, _)| i)
}

/// Observation nearest to `target`, ties to the earliest entry
pub fn closest_observation(
    observations: &[HourlyObservation],
    target: DateTime<Utc>,
) -> Option<&HourlyObservation> {
    let times: Vec<DateTime<Utc>> = observations.iter().map(|o| o.time).collect();
    closest_index(&times, target).map(|i| &observations[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 18, h, m, 0).unwrap()
    }

    #[test]
    fn test_closest_picks_nearest_hour() {
        let times = [at(11, 0), at(12, 0), at(13, 0)];
        // 40 minutes to 12:00, 20 minutes to 13:00
        assert_eq!(closest_index(&times, at(12, 40)), Some(2));
        assert_eq!(closest_index(&times, at(12, 10)), Some(1));
    }

    #[test]
    fn test_closest_tie_keeps_first() {
        let times = [at(11, 0), at(12, 0), at(13, 0)];
        assert_eq!(closest_index(&times, at(12, 30)), Some(1));
    }

    #[test]
    fn test_closest_outside_range() {
        let times = [at(11, 0), at(12, 0)];
        assert_eq!(closest_index(&times, at(23, 0)), Some(1));
        assert_eq!(closest_index(&times, at(0, 0)), Some(0));
    }

    #[test]
    fn test_closest_empty() {
        assert_eq!(closest_index(&[], at(12, 0)), None);
        assert!(closest_observation(&[], at(12, 0)).is_none());
    }

    #[test]
    fn test_closest_observation_condition() {
        let observations = vec![
            HourlyObservation::new(at(11, 0), 17.0, 0),
            HourlyObservation::new(at(12, 0), 18.0, 61),
            HourlyObservation::new(at(13, 0), 19.0, 48),
        ];

        let chosen = closest_observation(&observations, at(12, 40)).unwrap();
        assert_eq!(chosen.temperature, 19.0);
        assert_eq!(chosen.condition(), WeatherCondition::Fog);
    }
}
