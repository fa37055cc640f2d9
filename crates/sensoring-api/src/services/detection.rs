use sensoring_core::models::{DetectionId, DetectionPage, StoredDetection};
use sensoring_core::SensoringError;

use crate::dto::{DetectionQueryParams, DetectionRequest, EnrichmentSummary};
use crate::error::ApiError;
use crate::state::AppState;

/// Service for recording and listing detections
pub struct DetectionService;

impl DetectionService {
    /// Validate, enrich and store a single detection
    pub async fn record(state: &AppState, request: DetectionRequest) -> Result<StoredDetection, ApiError> {
        let event = request.into_event(&state.rules)?;
        let camera_id = event.camera_id.clone();

        let enriched = match state.enricher.enrich_one(event.clone()).await {
            Ok(enriched) => enriched,
            Err(e) => {
                tracing::warn!(camera_id = %camera_id, error = %e, "Enrichment failed, storing without weather");
                event
            }
        };

        let mut stored = state.detection_store.store_detections(&[enriched]).await?;
        let detection = stored
            .pop()
            .ok_or_else(|| ApiError::internal("Store returned no detection"))?;

        tracing::info!(
            camera_id = %camera_id,
            id = %detection.id,
            has_weather = detection.event.weather.is_present(),
            "Recorded detection"
        );
        Ok(detection)
    }

    /// Validate every detection, enrich the batch and store it in one write.
    ///
    /// Nothing is stored if any detection is invalid.
    pub async fn record_batch(
        state: &AppState,
        requests: Vec<DetectionRequest>,
    ) -> Result<(Vec<StoredDetection>, EnrichmentSummary), ApiError> {
        if requests.is_empty() {
            return Err(ApiError::bad_request("Invalid detection")
                .with_detail("batch must contain at least one detection."));
        }

        let mut events = Vec::with_capacity(requests.len());
        let mut issues = Vec::new();
        for (index, request) in requests.into_iter().enumerate() {
            match request.into_event(&state.rules) {
                Ok(event) => events.push(event),
                Err(SensoringError::InvalidDetection(found)) => {
                    issues.extend(found.into_iter().map(|issue| format!("[{}] {}", index, issue)));
                }
                Err(other) => return Err(other.into()),
            }
        }
        if !issues.is_empty() {
            return Err(SensoringError::InvalidDetection(issues).into());
        }

        let batch = state.enricher.enrich_many(events).await;
        let summary = EnrichmentSummary::from(&batch);
        let stored = state.detection_store.store_detections(&batch.detections).await?;

        tracing::info!(
            count = stored.len(),
            groups = summary.groups,
            created = summary.created,
            failed = summary.failed_groups.len(),
            "Recorded detection batch"
        );
        Ok((stored, summary))
    }

    /// Filtered, paginated listing
    pub async fn list(state: &AppState, params: DetectionQueryParams) -> Result<DetectionPage, ApiError> {
        let query = params.into_query(&state.rules)?;
        Ok(state.detection_store.query_detections(&query).await?)
    }

    pub async fn get(state: &AppState, id: i64) -> Result<StoredDetection, ApiError> {
        state
            .detection_store
            .get_detection(DetectionId(id))
            .await?
            .ok_or_else(|| {
                SensoringError::NotFound {
                    entity: "Detection",
                    id: id.to_string(),
                }
                .into()
            })
    }
}
