pub mod detection;
pub mod location;
pub mod query;
pub mod weather;

pub use detection::{DetectionEvent, DetectionId, StoredDetection, WeatherLink};
pub use location::Location;
pub use query::{DetectionPage, DetectionQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use weather::{BucketKey, NewWeatherRecord, WeatherCondition, WeatherId, WeatherRecord};
