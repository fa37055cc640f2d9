//! DetectionStore implementation for PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sensoring_core::error::Result;
use sensoring_core::models::{
    DetectionEvent, DetectionId, DetectionPage, DetectionQuery, Location, StoredDetection,
    WeatherCondition, WeatherId, WeatherLink, WeatherRecord,
};
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};

use super::weather::row_error;
use super::{storage_error, PostgresStore};
use crate::ports::DetectionStore;

const DETECTION_SELECT: &str = r#"
    SELECT d.id, d.camera_id, d.detected_at, d.latitude, d.longitude, d.waste_type,
           d.confidence, d.weather_id,
           w.temperature AS w_temperature, w.weather_condition AS w_condition,
           w.latitude AS w_latitude, w.longitude AS w_longitude, w.observed_at AS w_observed_at
    FROM waste_detections d
    LEFT JOIN weather_data w ON w.id = d.weather_id
"#;

const DETECTION_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM waste_detections d
    LEFT JOIN weather_data w ON w.id = d.weather_id
"#;

#[async_trait]
impl DetectionStore for PostgresStore {
    async fn store_detections(&self, detections: &[DetectionEvent]) -> Result<Vec<StoredDetection>> {
        if detections.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("Failed to begin transaction", e))?;

        let mut stored = Vec::with_capacity(detections.len());
        for event in detections {
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO waste_detections
                    (camera_id, detected_at, latitude, longitude, waste_type, confidence, weather_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                "#,
            )
            .bind(&event.camera_id)
            .bind(event.timestamp)
            .bind(event.location.latitude)
            .bind(event.location.longitude)
            .bind(&event.waste_type)
            .bind(event.confidence)
            .bind(event.weather.weather_id().map(|id| id.0))
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| storage_error("Failed to insert detection", e))?;

            stored.push(StoredDetection {
                id: DetectionId(id),
                event: event.clone(),
            });
        }

        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit detections", e))?;

        tracing::debug!(count = stored.len(), "Stored detections");
        Ok(stored)
    }

    async fn query_detections(&self, query: &DetectionQuery) -> Result<DetectionPage> {
        let mut count_builder: QueryBuilder<Postgres> = QueryBuilder::new(DETECTION_COUNT);
        push_filters(&mut count_builder, query);

        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to count detections", e))?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(DETECTION_SELECT);
        push_filters(&mut builder, query);
        builder.push(" ORDER BY d.id ASC LIMIT ");
        builder.push_bind(i64::from(query.effective_page_size()));
        builder.push(" OFFSET ");
        builder.push_bind(query.offset() as i64);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to query detections", e))?;

        let data = rows
            .iter()
            .map(detection_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(DetectionPage::new(query, total.max(0) as u64, data))
    }

    async fn get_detection(&self, id: DetectionId) -> Result<Option<StoredDetection>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(DETECTION_SELECT);
        builder.push(" WHERE d.id = ");
        builder.push_bind(id.0);

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to get detection", e))?;

        row.as_ref().map(detection_from_row).transpose()
    }
}

/// Append the WHERE clause for every filter set on the query
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &DetectionQuery) {
    builder.push(" WHERE TRUE");

    if let Some(camera_id) = &query.camera_id {
        builder.push(" AND d.camera_id = ");
        builder.push_bind(camera_id.clone());
    }
    if let Some(from_id) = query.from_id {
        builder.push(" AND d.id >= ");
        builder.push_bind(from_id.0);
    }
    if let Some(waste_type) = &query.waste_type {
        builder.push(" AND LOWER(d.waste_type) = LOWER(");
        builder.push_bind(waste_type.clone());
        builder.push(")");
    }
    if let Some(condition) = query.weather_condition {
        builder.push(" AND w.weather_condition = ");
        builder.push_bind(condition.label());
    }
    if let Some(from) = query.from {
        builder.push(" AND d.detected_at >= ");
        builder.push_bind(from);
    }
    if let Some(to) = query.to {
        builder.push(" AND d.detected_at <= ");
        builder.push_bind(to);
    }
    if let Some(min) = query.confidence_min {
        builder.push(" AND d.confidence >= ");
        builder.push_bind(min);
    }
    if let Some(max) = query.confidence_max {
        builder.push(" AND d.confidence <= ");
        builder.push_bind(max);
    }
}

fn detection_from_row(row: &PgRow) -> Result<StoredDetection> {
    let weather_id: Option<i64> = row.try_get("weather_id").map_err(row_error)?;

    let weather = match weather_id {
        Some(id) => {
            let condition: String = row.try_get("w_condition").map_err(row_error)?;
            let observed_at: DateTime<Utc> = row.try_get("w_observed_at").map_err(row_error)?;
            WeatherLink::Present(WeatherRecord {
                id: WeatherId(id),
                temperature: row.try_get("w_temperature").map_err(row_error)?,
                condition: condition.parse::<WeatherCondition>()?,
                location: Location::new(
                    row.try_get("w_latitude").map_err(row_error)?,
                    row.try_get("w_longitude").map_err(row_error)?,
                ),
                observed_at,
            })
        }
        None => WeatherLink::Absent,
    };

    let event = DetectionEvent {
        camera_id: row.try_get("camera_id").map_err(row_error)?,
        timestamp: row.try_get("detected_at").map_err(row_error)?,
        location: Location::new(
            row.try_get("latitude").map_err(row_error)?,
            row.try_get("longitude").map_err(row_error)?,
        ),
        waste_type: row.try_get("waste_type").map_err(row_error)?,
        confidence: row.try_get("confidence").map_err(row_error)?,
        weather,
    };

    Ok(StoredDetection {
        id: DetectionId(row.try_get("id").map_err(row_error)?),
        event,
    })
}
