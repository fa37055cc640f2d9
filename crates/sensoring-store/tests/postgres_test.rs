//! PostgreSQL adapter tests
//!
//! These run against the database in `SENSORING_TEST_DATABASE_URL` and are
//! skipped when it is not set.

use chrono::{TimeZone, Utc};
use sensoring_core::models::{
    BucketKey, DetectionEvent, DetectionQuery, Location, NewWeatherRecord, WeatherCondition,
    WeatherLink,
};
use sensoring_store::{DetectionStore, InsertOutcome, PostgresConfig, PostgresStore, WeatherStore};

async fn test_store() -> Option<PostgresStore> {
    let url = std::env::var("SENSORING_TEST_DATABASE_URL").ok()?;
    let config = PostgresConfig::new(url).unwrap();
    Some(PostgresStore::connect(config).await.unwrap())
}

/// A bucket no other run uses, so repeated runs do not collide
fn fresh_key() -> BucketKey {
    let hours = Utc::now().timestamp_micros() % 1_000_000_000;
    let hour = Utc.timestamp_opt(hours * 3600, 0).single().unwrap();
    BucketKey::new(Location::new(-89.99, -179.99), hour)
}

#[tokio::test]
async fn test_weather_insert_then_conflict() {
    let Some(store) = test_store().await else {
        return;
    };

    let key = fresh_key();
    let first = store
        .insert_weather(&NewWeatherRecord::new(key, 14.0, WeatherCondition::Fog))
        .await
        .unwrap();
    let second = store
        .insert_weather(&NewWeatherRecord::new(key, 30.0, WeatherCondition::Sunny))
        .await
        .unwrap();

    let InsertOutcome::Inserted(record) = first else {
        panic!("expected first insert to succeed");
    };
    assert_eq!(second, InsertOutcome::Conflict);
    assert_eq!(record.key(), key);

    let cached = store.find_weather(&key).await.unwrap().unwrap();
    assert_eq!(cached.id, record.id);
    assert_eq!(cached.condition, WeatherCondition::Fog);
}

#[tokio::test]
async fn test_detections_round_trip_with_weather() {
    let Some(store) = test_store().await else {
        return;
    };

    let key = fresh_key();
    let record = match store
        .insert_weather(&NewWeatherRecord::new(key, 9.5, WeatherCondition::Rainy))
        .await
        .unwrap()
    {
        InsertOutcome::Inserted(record) => record,
        InsertOutcome::Conflict => store.find_weather(&key).await.unwrap().unwrap(),
    };

    let camera = format!("pg-test-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let at = Utc.with_ymd_and_hms(2024, 6, 18, 12, 10, 0).unwrap();
    let events = vec![
        DetectionEvent::new(&camera, at, key.location(), "Glas", 0.9)
            .with_weather(WeatherLink::Present(record.clone())),
        DetectionEvent::new(&camera, at, key.location(), "Papier", 0.4),
    ];

    let stored = store.store_detections(&events).await.unwrap();
    assert_eq!(stored.len(), 2);

    let fetched = store.get_detection(stored[0].id).await.unwrap().unwrap();
    assert_eq!(fetched.event.weather.weather_id(), Some(record.id));

    let query = DetectionQuery {
        weather_condition: Some(WeatherCondition::Rainy),
        ..DetectionQuery::new().with_camera(camera.clone())
    };
    let page = store.query_detections(&query).await.unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.data[0].event.waste_type, "Glas");

    let all = store
        .query_detections(&DetectionQuery::new().with_camera(camera))
        .await
        .unwrap();
    assert_eq!(all.total_count, 2);
    assert!(!all.data[1].event.weather.is_present());
}

#[tokio::test]
async fn test_connect_leaves_nothing_pending() {
    let Some(store) = test_store().await else {
        return;
    };

    assert_eq!(store.run_migrations().await.unwrap(), 0);
    store.health_check().await.unwrap();
}
