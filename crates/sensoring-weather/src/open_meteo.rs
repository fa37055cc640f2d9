//! Open-Meteo hourly weather client

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sensoring_core::config::DEFAULT_WEATHER_URL;
use serde::Deserialize;
use std::time::Duration;

use crate::error::WeatherError;
use crate::ports::{HourlyObservation, WeatherLookup};

/// Time format of the `hourly.time` array
const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Client for the Open-Meteo forecast API
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    /// Forecast endpoint (e.g., "https://api.open-meteo.com/v1/forecast")
    base_url: String,

    /// Per-request timeout
    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenMeteoClient {
    /// Create a new client for the given endpoint
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into(),
            timeout,
            client,
        })
    }

    /// Create a client for the public Open-Meteo endpoint
    pub fn public(timeout: Duration) -> Result<Self, WeatherError> {
        Self::new(DEFAULT_WEATHER_URL, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn day_url(&self, latitude: f64, longitude: f64, date: NaiveDate) -> String {
        let day = date.format("%Y-%m-%d");
        format!(
            "{}?latitude={}&longitude={}&start_date={}&end_date={}&hourly=temperature_2m,weathercode&timezone=GMT",
            self.base_url, latitude, longitude, day, day
        )
    }
}

#[async_trait]
impl WeatherLookup for OpenMeteoClient {
    async fn fetch_hourly(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<Vec<HourlyObservation>, WeatherError> {
        let url = self.day_url(latitude, longitude, date);
        tracing::debug!(%url, "Requesting hourly weather");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                WeatherError::Timeout(self.timeout)
            } else {
                WeatherError::Request(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Status { status, body });
        }

        let text = response.text().await?;
        parse_hourly(&text)
    }

    fn name(&self) -> &str {
        "open-meteo"
    }
}

/// Response from the Open-Meteo forecast API
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: Option<HourlyBlock>,
}

/// Parallel hourly arrays; individual values may be null
#[derive(Debug, Deserialize)]
struct HourlyBlock {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<i32>>,
}

/// Parse an Open-Meteo body into observations.
///
/// A missing or empty hourly block yields no observations. Hours without a
/// temperature are skipped; hours without a code keep an unmapped code.
pub fn parse_hourly(body: &str) -> Result<Vec<HourlyObservation>, WeatherError> {
    let response: OpenMeteoResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::Parse(e.to_string()))?;

    let Some(hourly) = response.hourly else {
        return Ok(Vec::new());
    };

    if hourly.time.is_empty() {
        return Ok(Vec::new());
    }

    if hourly.time.len() != hourly.temperature_2m.len()
        || hourly.time.len() != hourly.weathercode.len()
    {
        return Err(WeatherError::LengthMismatch {
            times: hourly.time.len(),
            temperatures: hourly.temperature_2m.len(),
            codes: hourly.weathercode.len(),
        });
    }

    let mut observations = Vec::with_capacity(hourly.time.len());
    for ((time, temperature), code) in
        hourly.time.iter().zip(hourly.temperature_2m).zip(hourly.weathercode)
    {
        let Some(temperature) = temperature else {
            continue;
        };
        observations.push(HourlyObservation::new(
            parse_time(time)?,
            temperature,
            code.unwrap_or(-1),
        ));
    }

    Ok(observations)
}

fn parse_time(time_str: &str) -> Result<DateTime<Utc>, WeatherError> {
    NaiveDateTime::parse_from_str(time_str, HOURLY_TIME_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|_| WeatherError::InvalidTime(time_str.to_string()))
}
