//! Error types for Sensoring

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensoringError {
    // Validation errors
    #[error("Invalid detection: {}", .0.join(" "))]
    InvalidDetection(Vec<String>),

    #[error("Invalid query: {}", .0.join(" "))]
    InvalidQuery(Vec<String>),

    // Lookup errors
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SensoringError {
    /// Validation messages carried by this error, if it is a validation error
    pub fn issues(&self) -> Option<&[String]> {
        match self {
            SensoringError::InvalidDetection(issues) | SensoringError::InvalidQuery(issues) => {
                Some(issues)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SensoringError>;
