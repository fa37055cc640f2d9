//! Router tests against the in-memory store and a stub weather lookup

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use sensoring_api::config::Passwords;
use sensoring_api::{create_router, AppState};
use sensoring_core::config::EnrichmentSettings;
use sensoring_core::DetectionRules;
use sensoring_weather::{HourlyObservation, WeatherError, WeatherLookup};
use serde_json::{json, Value};
use tower::ServiceExt;

const READ: &str = "read-secret";
const WRITE: &str = "write-secret";

/// Returns one observation per hour of the requested day, code 3
#[derive(Default)]
struct StubLookup {
    calls: AtomicUsize,
}

#[async_trait]
impl WeatherLookup for StubLookup {
    async fn fetch_hourly(
        &self,
        _latitude: f64,
        _longitude: f64,
        date: NaiveDate,
    ) -> Result<Vec<HourlyObservation>, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..24)
            .map(|h| {
                let time = date.and_hms_opt(h, 0, 0).unwrap().and_utc();
                HourlyObservation::new(time, 10.0 + f64::from(h), 3)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

fn app() -> (Router, Arc<StubLookup>) {
    let lookup = Arc::new(StubLookup::default());
    let state = AppState::in_memory(
        lookup.clone(),
        EnrichmentSettings {
            max_concurrent_lookups: 2,
            lookup_timeout: Duration::from_secs(2),
        },
        DetectionRules::default(),
        Passwords::new(READ, WRITE),
    );
    (create_router(Arc::new(state)), lookup)
}

fn detection_body(camera: &str, date_time: &str, lat: f64, lon: f64) -> Value {
    json!({
        "cameraId": camera,
        "dateTime": date_time,
        "location": { "latitude": lat, "longitude": lon },
        "type": "glas",
        "confidence": 0.87
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    password: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(password) = password {
        builder = builder.header("X-Api-Password", password);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn test_health_needs_no_password() {
    let (app, _) = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "sensoring-api");
}

#[tokio::test]
async fn test_create_detection_enriches_and_stores() {
    let (app, lookup) = app();

    let (status, body) = send(
        &app,
        "POST",
        "/wastedetection",
        Some(WRITE),
        Some(detection_body("cam-1", "2024-06-18T12:40:00Z", 52.1049, 4.2951)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["cameraId"], "cam-1");
    assert_eq!(body["type"], "Glas");
    assert_eq!(body["temperature"], 23.0);
    assert_eq!(body["weatherCondition"], "Regenachtig");
    assert!(body["weatherId"].is_number());
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);

    let id = body["id"].as_i64().unwrap();
    let (status, fetched) =
        send(&app, "GET", &format!("/wastedetection/{}", id), Some(READ), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["weatherId"], body["weatherId"]);
}

#[tokio::test]
async fn test_read_password_cannot_write() {
    let (app, _) = app();

    let (status, _) = send(
        &app,
        "POST",
        "/wastedetection",
        Some(READ),
        Some(detection_body("cam-1", "2024-06-18T12:40:00Z", 52.1, 4.3)),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_write_password_can_read() {
    let (app, _) = app();
    let (status, body) = send(&app, "GET", "/wastedetection", Some(WRITE), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 0);
    assert_eq!(body["pageNumber"], 1);
    assert_eq!(body["pageSize"], 100);
}

#[tokio::test]
async fn test_missing_or_wrong_password_is_rejected() {
    let (app, _) = app();

    let (status, _) = send(&app, "GET", "/wastedetection", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/wastedetection", Some("guess"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_detection_lists_every_issue() {
    let (app, lookup) = app();

    let (status, body) = send(
        &app,
        "POST",
        "/wastedetection",
        Some(WRITE),
        Some(json!({
            "cameraId": "cam-1",
            "dateTime": "2024-06-18T12:40:00Z",
            "location": { "latitude": 95.0, "longitude": 4.3 },
            "type": "Karton",
            "confidence": 0.5
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid detection");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (app, _) = app();

    let request = Request::builder()
        .method("POST")
        .uri("/wastedetection")
        .header("X-Api-Password", WRITE)
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_shares_weather_per_bucket() {
    let (app, lookup) = app();

    let (status, body) = send(
        &app,
        "POST",
        "/wastedetection/batch",
        Some(WRITE),
        Some(json!([
            detection_body("a", "2024-06-18T12:10:00Z", 52.101, 4.301),
            detection_body("b", "2024-06-18T12:05:00Z", 52.104, 4.299),
            detection_body("c", "2024-06-18T15:00:00Z", 52.101, 4.301),
        ])),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["enrichment"]["groups"], 2);
    assert_eq!(body["enrichment"]["created"], 2);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);

    let data = body["data"].as_array().unwrap();
    let id_of = |camera: &str| {
        data.iter()
            .find(|d| d["cameraId"] == camera)
            .map(|d| d["weatherId"].clone())
            .unwrap()
    };
    assert_eq!(id_of("a"), id_of("b"));
    assert_ne!(id_of("a"), id_of("c"));
}

#[tokio::test]
async fn test_batch_with_invalid_member_stores_nothing() {
    let (app, _) = app();

    let mut bad = detection_body("b", "2024-06-18T12:05:00Z", 52.1, 4.3);
    bad["confidence"] = json!(3.0);

    let (status, body) = send(
        &app,
        "POST",
        "/wastedetection/batch",
        Some(WRITE),
        Some(json!([detection_body("a", "2024-06-18T12:10:00Z", 52.1, 4.3), bad])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"][0].as_str().unwrap().starts_with("[1] "));

    let (_, page) = send(&app, "GET", "/wastedetection", Some(READ), None).await;
    assert_eq!(page["totalCount"], 0);
}

#[tokio::test]
async fn test_list_filters_and_paginates() {
    let (app, _) = app();

    let batch: Vec<Value> = (0..5)
        .map(|i| detection_body("cam-1", &format!("2024-06-18T1{}:00:00Z", i), 52.1, 4.3))
        .chain([detection_body("cam-2", "2024-06-18T12:00:00Z", 52.1, 4.3)])
        .collect();
    let (status, _) =
        send(&app, "POST", "/wastedetection/batch", Some(WRITE), Some(json!(batch))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, page) = send(
        &app,
        "GET",
        "/wastedetection?cameraId=cam-1&pageNumber=2&pageSize=2",
        Some(READ),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalCount"], 5);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);

    let (_, rainy) = send(
        &app,
        "GET",
        "/wastedetection?weatherCondition=regenachtig&type=GLAS",
        Some(READ),
        None,
    )
    .await;
    assert_eq!(rainy["totalCount"], 6);
}

#[tokio::test]
async fn test_invalid_query_lists_every_issue() {
    let (app, _) = app();

    let (status, body) = send(
        &app,
        "GET",
        "/wastedetection?pageNumber=0&confidenceMin=0.9&confidenceMax=0.1&weatherCondition=Winderig",
        Some(READ),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(details.contains(&"pageNumber must be at least 1."));
    assert!(details.contains(&"confidenceMin cannot be greater than confidenceMax."));
    assert!(details.iter().any(|d| d.starts_with("weatherCondition 'Winderig'")));
}

#[tokio::test]
async fn test_unknown_detection_is_not_found() {
    let (app, _) = app();
    let (status, body) = send(&app, "GET", "/wastedetection/999", Some(READ), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Detection 999 not found");
}
