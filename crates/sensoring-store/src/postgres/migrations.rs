//! Embedded schema migrations for `weather_data` and `waste_detections`

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;
use thiserror::Error;

/// Migrations compiled in from `crates/sensoring-store/migrations`
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Failed(#[from] MigrateError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Versions recorded as applied; empty before the first run
async fn applied_versions(pool: &PgPool) -> Result<Vec<i64>, MigrationError> {
    let exists: bool = sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
        .fetch_one(pool)
        .await?;
    if !exists {
        return Ok(Vec::new());
    }

    let versions = sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
        .fetch_all(pool)
        .await?;
    Ok(versions)
}

/// Embedded migrations not yet applied, as `(version, description)`
pub async fn pending(pool: &PgPool) -> Result<Vec<(i64, String)>, MigrationError> {
    let applied = applied_versions(pool).await?;
    Ok(MIGRATOR
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .map(|m| (m.version, m.description.to_string()))
        .collect())
}

/// Apply every pending migration and return how many ran
pub async fn apply(pool: &PgPool) -> Result<usize, MigrationError> {
    let pending = pending(pool).await?;
    for (version, description) in &pending {
        tracing::info!(version, description = %description, "Applying migration");
    }
    MIGRATOR.run(pool).await?;
    Ok(pending.len())
}
