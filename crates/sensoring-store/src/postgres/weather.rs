//! WeatherStore implementation for PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sensoring_core::error::{Result, SensoringError};
use sensoring_core::models::{
    BucketKey, Location, NewWeatherRecord, WeatherCondition, WeatherId, WeatherRecord,
};
use sqlx::postgres::PgRow;
use sqlx::Row;

use super::{storage_error, PostgresStore};
use crate::ports::{InsertOutcome, WeatherStore};

const WEATHER_COLUMNS: &str =
    "id, temperature, weather_condition, latitude, longitude, observed_at";

#[async_trait]
impl WeatherStore for PostgresStore {
    async fn find_weather(&self, key: &BucketKey) -> Result<Option<WeatherRecord>> {
        let sql = format!(
            "SELECT {} FROM weather_data WHERE lat_e2 = $1 AND lon_e2 = $2 AND observed_at = $3",
            WEATHER_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(key.latitude_e2)
            .bind(key.longitude_e2)
            .bind(key.hour)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to look up weather", e))?;

        row.map(|r| weather_from_row(&r)).transpose()
    }

    async fn insert_weather(&self, record: &NewWeatherRecord) -> Result<InsertOutcome> {
        let location = record.key.location();
        let sql = format!(
            r#"
            INSERT INTO weather_data
                (temperature, weather_condition, latitude, longitude, lat_e2, lon_e2, observed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (lat_e2, lon_e2, observed_at) DO NOTHING
            RETURNING {}
            "#,
            WEATHER_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(record.temperature)
            .bind(record.condition.label())
            .bind(location.latitude)
            .bind(location.longitude)
            .bind(record.key.latitude_e2)
            .bind(record.key.longitude_e2)
            .bind(record.key.hour)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to insert weather", e))?;

        match row {
            Some(row) => Ok(InsertOutcome::Inserted(weather_from_row(&row)?)),
            None => Ok(InsertOutcome::Conflict),
        }
    }

    async fn get_weather(&self, id: WeatherId) -> Result<Option<WeatherRecord>> {
        let sql = format!("SELECT {} FROM weather_data WHERE id = $1", WEATHER_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to get weather", e))?;

        row.map(|r| weather_from_row(&r)).transpose()
    }
}

fn weather_from_row(row: &PgRow) -> Result<WeatherRecord> {
    let condition: String = row.try_get("weather_condition").map_err(row_error)?;
    let observed_at: DateTime<Utc> = row.try_get("observed_at").map_err(row_error)?;

    Ok(WeatherRecord {
        id: WeatherId(row.try_get("id").map_err(row_error)?),
        temperature: row.try_get("temperature").map_err(row_error)?,
        condition: condition.parse::<WeatherCondition>()?,
        location: Location::new(
            row.try_get("latitude").map_err(row_error)?,
            row.try_get("longitude").map_err(row_error)?,
        ),
        observed_at,
    })
}

pub(super) fn row_error(e: sqlx::Error) -> SensoringError {
    storage_error("Failed to decode row", e)
}
