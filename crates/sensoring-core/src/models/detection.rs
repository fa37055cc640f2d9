use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{BucketKey, Location, WeatherCondition, WeatherId, WeatherRecord};

/// Unique identifier for a stored detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DetectionId(pub i64);

impl fmt::Display for DetectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Weather attached to a detection.
///
/// `Absent` is a normal outcome: enrichment failures never block storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum WeatherLink {
    Present(WeatherRecord),
    #[default]
    Absent,
}

impl WeatherLink {
    pub fn is_present(&self) -> bool {
        matches!(self, WeatherLink::Present(_))
    }

    pub fn record(&self) -> Option<&WeatherRecord> {
        match self {
            WeatherLink::Present(record) => Some(record),
            WeatherLink::Absent => None,
        }
    }

    pub fn weather_id(&self) -> Option<WeatherId> {
        self.record().map(|r| r.id)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.record().map(|r| r.temperature)
    }

    pub fn condition(&self) -> Option<WeatherCondition> {
        self.record().map(|r| r.condition)
    }
}

impl From<Option<WeatherRecord>> for WeatherLink {
    fn from(record: Option<WeatherRecord>) -> Self {
        match record {
            Some(record) => WeatherLink::Present(record),
            None => WeatherLink::Absent,
        }
    }
}

/// One waste item reported by a camera, before it is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// Reporting camera
    pub camera_id: String,

    /// When the item was observed
    pub timestamp: DateTime<Utc>,

    /// Where the item was observed
    pub location: Location,

    /// Waste category, canonical casing from the configured allowed set
    pub waste_type: String,

    /// Classifier confidence
    pub confidence: f32,

    /// Weather at the detection's bucket
    #[serde(default)]
    pub weather: WeatherLink,
}

impl DetectionEvent {
    /// Create a detection without weather
    pub fn new(
        camera_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        location: Location,
        waste_type: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            camera_id: camera_id.into(),
            timestamp,
            location,
            waste_type: waste_type.into(),
            confidence,
            weather: WeatherLink::Absent,
        }
    }

    /// Weather bucket this detection belongs to
    pub fn bucket_key(&self) -> BucketKey {
        BucketKey::new(self.location, self.timestamp)
    }

    pub fn with_weather(mut self, weather: WeatherLink) -> Self {
        self.weather = weather;
        self
    }
}

/// A detection that has been assigned an identifier by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDetection {
    pub id: DetectionId,

    #[serde(flatten)]
    pub event: DetectionEvent,
}
