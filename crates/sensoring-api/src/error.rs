use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sensoring_core::error::SensoringError;
use serde::Serialize;
use thiserror::Error;

/// Unified API error type
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SensoringError> for ApiError {
    fn from(err: SensoringError) -> Self {
        match err {
            SensoringError::InvalidDetection(issues) => {
                Self::bad_request("Invalid detection").with_details(issues)
            }
            SensoringError::InvalidQuery(issues) => {
                Self::bad_request("Invalid query").with_details(issues)
            }
            SensoringError::NotFound { entity, id } => {
                Self::not_found(format!("{} {} not found", entity, id))
            }
            other => {
                tracing::error!(error = %other, "Request failed");
                Self::internal("Internal error").with_detail(other.to_string())
            }
        }
    }
}
