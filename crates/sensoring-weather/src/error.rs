use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when looking up weather.
///
/// The enricher treats every variant as "no data"; they exist so the cause can
/// be logged.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Weather API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// Failed to parse the response body
    #[error("Failed to parse weather response: {0}")]
    Parse(String),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// Hourly arrays disagree in length
    #[error("Hourly series length mismatch: {times} times, {temperatures} temperatures, {codes} codes")]
    LengthMismatch {
        times: usize,
        temperatures: usize,
        codes: usize,
    },

    /// Invalid time format in response
    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    /// Lookup exceeded its time budget
    #[error("Weather lookup timed out after {0:?}")]
    Timeout(Duration),
}
