//! PostgreSQL adapter for both storage ports
//!
//! The unique `(lat_e2, lon_e2, observed_at)` constraint on `weather_data`
//! is what turns concurrent inserts for one bucket into
//! [`InsertOutcome::Conflict`](crate::ports::InsertOutcome::Conflict).

pub mod config;
pub mod detection;
pub mod migrations;
pub mod weather;

pub use config::{ConfigError, MigrationConfig, PoolConfig, PostgresConfig};
pub use migrations::MigrationError;

use sensoring_core::error::{Result, SensoringError};
use sqlx::{postgres::PgPoolOptions, PgPool};

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Open a pool and apply pending migrations when `migrations.auto_run` is set
    pub async fn connect(config: PostgresConfig) -> Result<Self> {
        config.validate().map_err(|e| SensoringError::ConfigInvalid {
            key: "DATABASE_URL".to_string(),
            reason: e.to_string(),
        })?;

        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .idle_timeout(config.pool.idle_timeout)
            .max_lifetime(config.pool.max_lifetime)
            .connect(&config.database_url)
            .await
            .map_err(|e| storage_error("Failed to connect to database", e))?;

        let store = Self::from_pool(pool);
        store.health_check().await?;
        tracing::info!(
            url = %config.redacted_url(),
            max_connections = config.pool.max_connections,
            "Connected to PostgreSQL"
        );

        if config.migrations.auto_run {
            let applied = store.run_migrations().await?;
            tracing::info!(applied, "Database schema is up to date");
        }

        Ok(store)
    }

    /// Wrap an existing pool without touching the schema
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending migrations, returning how many ran
    pub async fn run_migrations(&self) -> Result<usize> {
        migrations::apply(&self.pool)
            .await
            .map_err(|e| storage_error("Migration failed", e))
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Database health check failed", e))?;
        Ok(())
    }
}

pub(crate) fn storage_error(context: &str, err: impl std::fmt::Display) -> SensoringError {
    SensoringError::Storage(format!("{}: {}", context, err))
}
