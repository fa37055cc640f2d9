use async_trait::async_trait;
use sensoring_core::error::Result;
use sensoring_core::models::{
    BucketKey, DetectionEvent, DetectionId, DetectionPage, DetectionQuery, NewWeatherRecord,
    StoredDetection, WeatherId, WeatherRecord,
};

/// Result of inserting a weather record
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The record was written and assigned an id
    Inserted(WeatherRecord),

    /// Another writer already holds a record for the same bucket
    Conflict,
}

/// Port for the weather cache
#[async_trait]
pub trait WeatherStore: Send + Sync {
    /// Find the record cached for a bucket
    async fn find_weather(&self, key: &BucketKey) -> Result<Option<WeatherRecord>>;

    /// Insert a record unless its bucket is already taken.
    /// At most one record ever exists per bucket.
    async fn insert_weather(&self, record: &NewWeatherRecord) -> Result<InsertOutcome>;

    /// Get a weather record by ID
    async fn get_weather(&self, id: WeatherId) -> Result<Option<WeatherRecord>>;
}

/// Port for detection persistence and querying
#[async_trait]
pub trait DetectionStore: Send + Sync {
    /// Store detections, all or nothing.
    /// Returns them in input order with their assigned ids.
    async fn store_detections(&self, detections: &[DetectionEvent]) -> Result<Vec<StoredDetection>>;

    /// Filtered, paginated listing ordered by id
    async fn query_detections(&self, query: &DetectionQuery) -> Result<DetectionPage>;

    /// Get a single detection by ID
    async fn get_detection(&self, id: DetectionId) -> Result<Option<StoredDetection>>;
}
