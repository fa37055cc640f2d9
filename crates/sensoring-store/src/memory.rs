//! Weather and detection storage held in process memory.
//!
//! Used when no `DATABASE_URL` is configured and by tests. A poisoned lock
//! panics. Nothing survives a restart.

use async_trait::async_trait;
use sensoring_core::error::Result;
use sensoring_core::models::{
    BucketKey, DetectionEvent, DetectionId, DetectionPage, DetectionQuery, NewWeatherRecord,
    StoredDetection, WeatherId, WeatherRecord,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::ports::{DetectionStore, InsertOutcome, WeatherStore};

#[derive(Debug, Default)]
struct MemoryState {
    weather: HashMap<WeatherId, WeatherRecord>,
    weather_by_key: HashMap<BucketKey, WeatherId>,
    detections: BTreeMap<DetectionId, StoredDetection>,
    next_weather_id: i64,
    next_detection_id: i64,
}

/// In-memory implementation of WeatherStore and DetectionStore
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached weather records
    pub fn weather_count(&self) -> usize {
        self.state.read().unwrap().weather.len()
    }

    /// Number of stored detections
    pub fn detection_count(&self) -> usize {
        self.state.read().unwrap().detections.len()
    }
}

#[async_trait]
impl WeatherStore for MemoryStore {
    async fn find_weather(&self, key: &BucketKey) -> Result<Option<WeatherRecord>> {
        let state = self.state.read().unwrap();
        Ok(state
            .weather_by_key
            .get(key)
            .and_then(|id| state.weather.get(id))
            .cloned())
    }

    async fn insert_weather(&self, record: &NewWeatherRecord) -> Result<InsertOutcome> {
        let mut state = self.state.write().unwrap();

        if state.weather_by_key.contains_key(&record.key) {
            return Ok(InsertOutcome::Conflict);
        }

        state.next_weather_id += 1;
        let id = WeatherId(state.next_weather_id);
        let stored = record.clone().into_record(id);

        state.weather_by_key.insert(record.key, id);
        state.weather.insert(id, stored.clone());
        Ok(InsertOutcome::Inserted(stored))
    }

    async fn get_weather(&self, id: WeatherId) -> Result<Option<WeatherRecord>> {
        let state = self.state.read().unwrap();
        Ok(state.weather.get(&id).cloned())
    }
}

#[async_trait]
impl DetectionStore for MemoryStore {
    async fn store_detections(&self, detections: &[DetectionEvent]) -> Result<Vec<StoredDetection>> {
        let mut state = self.state.write().unwrap();
        let mut stored = Vec::with_capacity(detections.len());

        for event in detections {
            state.next_detection_id += 1;
            let detection = StoredDetection {
                id: DetectionId(state.next_detection_id),
                event: event.clone(),
            };
            state.detections.insert(detection.id, detection.clone());
            stored.push(detection);
        }

        Ok(stored)
    }

    async fn query_detections(&self, query: &DetectionQuery) -> Result<DetectionPage> {
        let state = self.state.read().unwrap();

        let matching: Vec<&StoredDetection> =
            state.detections.values().filter(|d| query.matches(d)).collect();

        let data = matching
            .iter()
            .skip(query.offset() as usize)
            .take(query.effective_page_size() as usize)
            .map(|d| (*d).clone())
            .collect();

        Ok(DetectionPage::new(query, matching.len() as u64, data))
    }

    async fn get_detection(&self, id: DetectionId) -> Result<Option<StoredDetection>> {
        let state = self.state.read().unwrap();
        Ok(state.detections.get(&id).cloned())
    }
}
