use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use crate::dto::{
    BatchResponse, DetectionQueryParams, DetectionRequest, DetectionResponse, PageResponse,
};
use crate::error::ApiError;
use crate::services::DetectionService;
use crate::state::AppState;

pub async fn create_detection(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DetectionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DetectionResponse>), ApiError> {
    let Json(request) = body.map_err(body_error)?;

    let detection = DetectionService::record(&state, request).await?;

    Ok((StatusCode::CREATED, Json(detection.into())))
}

pub async fn create_detection_batch(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Vec<DetectionRequest>>, JsonRejection>,
) -> Result<(StatusCode, Json<BatchResponse>), ApiError> {
    let Json(requests) = body.map_err(body_error)?;
    tracing::info!(count = requests.len(), "Processing detection batch");

    let (stored, enrichment) = DetectionService::record_batch(&state, requests).await?;

    Ok((
        StatusCode::CREATED,
        Json(BatchResponse {
            data: stored.into_iter().map(DetectionResponse::from).collect(),
            enrichment,
        }),
    ))
}

pub async fn list_detections(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DetectionQueryParams>, QueryRejection>,
) -> Result<Json<PageResponse>, ApiError> {
    let Query(params) = params.map_err(|e| {
        ApiError::bad_request("Invalid query").with_detail(e.body_text())
    })?;

    let page = DetectionService::list(&state, params).await?;

    Ok(Json(page.into()))
}

pub async fn get_detection(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DetectionResponse>, ApiError> {
    let Path(id) = id.map_err(|e| {
        ApiError::bad_request("Invalid detection id").with_detail(e.body_text())
    })?;

    let detection = DetectionService::get(&state, id).await?;

    Ok(Json(detection.into()))
}

fn body_error(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request("Invalid request body").with_detail(rejection.body_text())
}
