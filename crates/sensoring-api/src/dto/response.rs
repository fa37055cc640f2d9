use chrono::{DateTime, Utc};
use sensoring_core::models::{DetectionPage, StoredDetection, WeatherCondition};
use sensoring_enrichment::{EnrichedBatch, GroupFailure};
use serde::Serialize;

use super::LocationDto;

/// Stored detection with its weather flattened in
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResponse {
    pub id: i64,
    pub camera_id: String,
    pub date_time: DateTime<Utc>,
    pub location: LocationDto,
    #[serde(rename = "type")]
    pub waste_type: String,
    pub weather_id: Option<i64>,
    pub temperature: Option<f64>,
    pub weather_condition: Option<WeatherCondition>,
    pub confidence: f32,
}

impl From<StoredDetection> for DetectionResponse {
    fn from(detection: StoredDetection) -> Self {
        let event = detection.event;
        Self {
            id: detection.id.0,
            weather_id: event.weather.weather_id().map(|id| id.0),
            temperature: event.weather.temperature(),
            weather_condition: event.weather.condition(),
            camera_id: event.camera_id,
            date_time: event.timestamp,
            location: event.location.into(),
            waste_type: event.waste_type,
            confidence: event.confidence,
        }
    }
}

/// One page of detections
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub data: Vec<DetectionResponse>,
}

impl From<DetectionPage> for PageResponse {
    fn from(page: DetectionPage) -> Self {
        Self {
            page_number: page.page_number,
            page_size: page.page_size,
            total_pages: page.total_pages,
            total_count: page.total_count,
            data: page.data.into_iter().map(DetectionResponse::from).collect(),
        }
    }
}

/// Bucket that could not be resolved during a batch
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedGroup {
    pub latitude: f64,
    pub longitude: f64,
    pub hour: DateTime<Utc>,
    pub members: usize,
    pub error: String,
}

impl From<&GroupFailure> for FailedGroup {
    fn from(failure: &GroupFailure) -> Self {
        Self {
            latitude: failure.key.latitude(),
            longitude: failure.key.longitude(),
            hour: failure.key.hour,
            members: failure.members,
            error: failure.error.clone(),
        }
    }
}

/// How weather was resolved for a batch
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentSummary {
    pub groups: usize,
    pub found: usize,
    pub created: usize,
    pub unavailable: usize,
    pub failed_groups: Vec<FailedGroup>,
}

impl From<&EnrichedBatch> for EnrichmentSummary {
    fn from(batch: &EnrichedBatch) -> Self {
        Self {
            groups: batch.groups,
            found: batch.found,
            created: batch.created,
            unavailable: batch.unavailable,
            failed_groups: batch.failed_groups.iter().map(FailedGroup::from).collect(),
        }
    }
}

/// Stored batch plus enrichment summary
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub data: Vec<DetectionResponse>,
    pub enrichment: EnrichmentSummary,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            service: "sensoring-api".to_string(),
        }
    }
}
