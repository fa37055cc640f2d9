use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderName, HeaderValue, Method};
use sensoring_core::config::LayeredConfig;
use sensoring_store::postgres::{PostgresConfig, PostgresStore};
use sensoring_weather::{OpenMeteoClient, WeatherLookup};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sensoring_api::auth::PASSWORD_HEADER;
use sensoring_api::{create_router, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sensoring_api=info,sensoring_enrichment=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_config = ApiConfig::from_env();

    let mut layered = LayeredConfig::with_defaults();
    if let Some(path) = &api_config.config_path {
        layered = layered
            .load_from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
    }
    let layered = layered.load_from_env();
    for (key, (value, source)) in layered.to_inspection_map() {
        tracing::debug!(key = %key, value = %value, source = ?source, "Effective setting");
    }

    let rules = layered.detection_rules().context("Invalid detection rules")?;
    let settings = layered.enrichment_settings().context("Invalid enrichment settings")?;

    let lookup: Arc<dyn WeatherLookup> = Arc::new(
        OpenMeteoClient::new(layered.weather_base_url.value.clone(), settings.lookup_timeout)
            .context("Failed to build weather client")?,
    );

    tracing::info!(
        port = api_config.port,
        weather_url = %layered.weather_base_url.value,
        max_concurrent_lookups = settings.max_concurrent_lookups,
        allowed_types = rules.allowed_types().len(),
        "Starting Sensoring API server"
    );

    if api_config.passwords.read.is_none() || api_config.passwords.write.is_none() {
        tracing::warn!(
            "SENSORING_READ_PASSWORD or SENSORING_WRITE_PASSWORD is not set; matching routes reject every request"
        );
    }

    let state = if api_config.uses_postgres() {
        tracing::info!("DATABASE_URL found, connecting to PostgreSQL...");
        let pg_config = PostgresConfig::from_env().context("Invalid PostgreSQL configuration")?;
        let store = PostgresStore::connect(pg_config).await.context(
            "Failed to connect to PostgreSQL. Ensure it is running and DATABASE_URL is correct",
        )?;
        AppState::with_store(Arc::new(store), lookup, settings, rules, api_config.passwords.clone())
    } else {
        tracing::info!("Using in-memory storage (set DATABASE_URL for PostgreSQL)");
        AppState::in_memory(lookup, settings, rules, api_config.passwords.clone())
    };

    let origin = api_config
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid SENSORING_CORS_ORIGIN '{}'", api_config.cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(PASSWORD_HEADER)]);

    let app = create_router(Arc::new(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = api_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", api_config.cors_origin);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
