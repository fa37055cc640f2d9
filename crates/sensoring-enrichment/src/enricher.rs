use futures::stream::{self, StreamExt};
use sensoring_core::config::EnrichmentSettings;
use sensoring_core::error::{Result, SensoringError};
use sensoring_core::models::{
    BucketKey, DetectionEvent, NewWeatherRecord, WeatherLink, WeatherRecord,
};
use sensoring_store::ports::{InsertOutcome, WeatherStore};
use sensoring_weather::{HourlyObservation, WeatherLookup};
use serde::Serialize;
use std::sync::Arc;

use crate::grouper::{group, DetectionGroup};

/// Outcome of get-or-create for one bucket
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A record already existed, possibly written by a concurrent request
    Found(WeatherRecord),

    /// A new record was fetched and stored
    Created(WeatherRecord),

    /// No weather could be obtained for the bucket
    Unavailable,
}

impl Resolution {
    pub fn record(&self) -> Option<&WeatherRecord> {
        match self {
            Resolution::Found(record) | Resolution::Created(record) => Some(record),
            Resolution::Unavailable => None,
        }
    }

    pub fn into_link(self) -> WeatherLink {
        match self {
            Resolution::Found(record) | Resolution::Created(record) => WeatherLink::Present(record),
            Resolution::Unavailable => WeatherLink::Absent,
        }
    }
}

/// A bucket whose resolution hit a store error
#[derive(Debug, Clone, Serialize)]
pub struct GroupFailure {
    pub key: BucketKey,
    pub members: usize,
    pub error: String,
}

/// Result of enriching a batch
#[derive(Debug, Clone, Default)]
pub struct EnrichedBatch {
    /// Enriched detections, grouped by bucket in ascending key order
    pub detections: Vec<DetectionEvent>,

    pub groups: usize,
    pub found: usize,
    pub created: usize,
    pub unavailable: usize,
    pub failed_groups: Vec<GroupFailure>,
}

impl EnrichedBatch {
    /// Number of detections that ended up with weather attached
    pub fn enriched_count(&self) -> usize {
        self.detections.iter().filter(|d| d.weather.is_present()).count()
    }
}

/// Attaches cached or freshly fetched weather to detections
pub struct WeatherEnricher {
    lookup: Arc<dyn WeatherLookup>,
    store: Arc<dyn WeatherStore>,
    settings: EnrichmentSettings,
}

impl WeatherEnricher {
    pub fn new(
        lookup: Arc<dyn WeatherLookup>,
        store: Arc<dyn WeatherStore>,
        settings: EnrichmentSettings,
    ) -> Self {
        Self {
            lookup,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &EnrichmentSettings {
        &self.settings
    }

    /// Get or create the weather record for a bucket.
    ///
    /// Lookup failures resolve to [`Resolution::Unavailable`]; only store
    /// errors are returned as `Err`.
    pub async fn resolve(&self, key: &BucketKey) -> Result<Resolution> {
        if let Some(record) = self.store.find_weather(key).await? {
            tracing::debug!(bucket = %key, weather_id = %record.id, "Weather cache hit");
            return Ok(Resolution::Found(record));
        }

        let Some(observation) = self.lookup_observation(key).await else {
            return Ok(Resolution::Unavailable);
        };

        let new_record =
            NewWeatherRecord::new(*key, observation.temperature, observation.condition());

        match self.store.insert_weather(&new_record).await? {
            InsertOutcome::Inserted(record) => {
                tracing::info!(
                    bucket = %key,
                    weather_id = %record.id,
                    condition = %record.condition,
                    "Stored new weather record"
                );
                Ok(Resolution::Created(record))
            }
            InsertOutcome::Conflict => {
                tracing::debug!(bucket = %key, "Lost weather insert race, re-reading");
                match self.store.find_weather(key).await? {
                    Some(record) => Ok(Resolution::Found(record)),
                    None => Err(SensoringError::Storage(format!(
                        "weather for {} missing after conflicting insert",
                        key
                    ))),
                }
            }
        }
    }

    /// Closest observation for the bucket, or `None` on any lookup failure
    async fn lookup_observation(&self, key: &BucketKey) -> Option<HourlyObservation> {
        let lookup = self
            .lookup
            .observation_at(key.latitude(), key.longitude(), key.hour);

        match tokio::time::timeout(self.settings.lookup_timeout, lookup).await {
            Ok(Ok(Some(observation))) => Some(observation),
            Ok(Ok(None)) => {
                tracing::warn!(bucket = %key, upstream = self.lookup.name(), "No weather observations");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(bucket = %key, upstream = self.lookup.name(), error = %e, "Weather lookup failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    bucket = %key,
                    upstream = self.lookup.name(),
                    timeout = ?self.settings.lookup_timeout,
                    "Weather lookup timed out"
                );
                None
            }
        }
    }

    /// Attach weather to a single detection
    pub async fn enrich_one(&self, event: DetectionEvent) -> Result<DetectionEvent> {
        let resolution = self.resolve(&event.bucket_key()).await?;
        Ok(event.with_weather(resolution.into_link()))
    }

    /// Attach weather to a batch, resolving each bucket once.
    ///
    /// Buckets are resolved concurrently up to `max_concurrent_lookups`. A
    /// store error leaves that bucket's detections without weather.
    pub async fn enrich_many(&self, events: Vec<DetectionEvent>) -> EnrichedBatch {
        let groups = group(events);
        let concurrency = self.settings.max_concurrent_lookups.max(1);

        let resolved: Vec<(DetectionGroup, Result<Resolution>)> = stream::iter(groups)
            .map(|group| async move {
                let resolution = self.resolve(&group.key).await;
                (group, resolution)
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut batch = EnrichedBatch {
            groups: resolved.len(),
            ..EnrichedBatch::default()
        };

        for (group, resolution) in resolved {
            let link = match resolution {
                Ok(resolution) => {
                    match &resolution {
                        Resolution::Found(_) => batch.found += 1,
                        Resolution::Created(_) => batch.created += 1,
                        Resolution::Unavailable => batch.unavailable += 1,
                    }
                    resolution.into_link()
                }
                Err(e) => {
                    tracing::warn!(
                        bucket = %group.key,
                        group_size = group.len(),
                        error = %e,
                        "Weather resolution failed, storing group without weather"
                    );
                    batch.failed_groups.push(GroupFailure {
                        key: group.key,
                        members: group.len(),
                        error: e.to_string(),
                    });
                    WeatherLink::Absent
                }
            };

            batch.detections.extend(
                group
                    .members
                    .into_iter()
                    .map(|member| member.with_weather(link.clone())),
            );
        }

        tracing::debug!(
            groups = batch.groups,
            found = batch.found,
            created = batch.created,
            unavailable = batch.unavailable,
            failed = batch.failed_groups.len(),
            "Enriched detection batch"
        );

        batch
    }
}
