use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Location;
use crate::error::SensoringError;
use crate::rounding::{coordinate_from_hundredths, round_coordinate, round_to_hour};

/// Unique identifier for a stored weather record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeatherId(pub i64);

impl fmt::Display for WeatherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Weather condition labels mapped from WMO weather codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCondition {
    #[serde(rename = "Zonnig")]
    Sunny,
    #[serde(rename = "Bewolkt")]
    Cloudy,
    #[serde(rename = "Regenachtig")]
    Rainy,
    #[serde(rename = "Mist")]
    Fog,
    #[serde(rename = "Sneeuw")]
    Snow,
    #[serde(rename = "Onweer")]
    Thunderstorm,
    #[serde(rename = "Onbekend")]
    Unknown,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 7] = [
        Self::Sunny,
        Self::Cloudy,
        Self::Rainy,
        Self::Fog,
        Self::Snow,
        Self::Thunderstorm,
        Self::Unknown,
    ];

    /// Convert a WMO weather code to a condition.
    /// Codes outside the table map to `Unknown`.
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Sunny,
            1 | 2 => Self::Cloudy,
            3 | 51 | 53 | 55 | 61 | 63 | 65 => Self::Rainy,
            45 | 48 => Self::Fog,
            71 | 73 | 75 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    /// Label used on the wire and in the database
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sunny => "Zonnig",
            Self::Cloudy => "Bewolkt",
            Self::Rainy => "Regenachtig",
            Self::Fog => "Mist",
            Self::Snow => "Sneeuw",
            Self::Thunderstorm => "Onweer",
            Self::Unknown => "Onbekend",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WeatherCondition {
    type Err = SensoringError;

    /// Parse a condition label, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| SensoringError::Serialization(format!("Unknown weather condition: {}", s)))
    }
}

/// Cache key for one weather bucket: a 0.01 degree cell and a whole hour.
///
/// Coordinates are kept as whole hundredths so the key has exact equality
/// and a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey {
    pub latitude_e2: i32,
    pub longitude_e2: i32,
    pub hour: DateTime<Utc>,
}

impl BucketKey {
    /// Build the bucket for a raw position and timestamp
    pub fn new(location: Location, at: DateTime<Utc>) -> Self {
        Self {
            latitude_e2: round_coordinate(location.latitude),
            longitude_e2: round_coordinate(location.longitude),
            hour: round_to_hour(at),
        }
    }

    pub fn latitude(&self) -> f64 {
        coordinate_from_hundredths(self.latitude_e2)
    }

    pub fn longitude(&self) -> f64 {
        coordinate_from_hundredths(self.longitude_e2)
    }

    /// The rounded position of this bucket
    pub fn location(&self) -> Location {
        Location::new(self.latitude(), self.longitude())
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.2}, {:.2}) @ {}",
            self.latitude(),
            self.longitude(),
            self.hour.format("%Y-%m-%dT%H:%MZ")
        )
    }
}

/// Weather record that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWeatherRecord {
    pub key: BucketKey,
    pub temperature: f64,
    pub condition: WeatherCondition,
}

impl NewWeatherRecord {
    pub fn new(key: BucketKey, temperature: f64, condition: WeatherCondition) -> Self {
        Self { key, temperature, condition }
    }

    /// Attach a store-assigned identifier
    pub fn into_record(self, id: WeatherId) -> WeatherRecord {
        WeatherRecord {
            id,
            temperature: self.temperature,
            condition: self.condition,
            location: self.key.location(),
            observed_at: self.key.hour,
        }
    }
}

/// Cached weather observation for one bucket.
///
/// `location` and `observed_at` are always the rounded bucket values, never the
/// raw coordinates of the detection that triggered the fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub id: WeatherId,
    pub temperature: f64,
    pub condition: WeatherCondition,
    pub location: Location,
    pub observed_at: DateTime<Utc>,
}

impl WeatherRecord {
    pub fn key(&self) -> BucketKey {
        BucketKey::new(self.location, self.observed_at)
    }
}
