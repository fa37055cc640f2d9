//! Database settings read from the environment

use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Connection settings for [`PostgresStore`](super::PostgresStore)
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub pool: PoolConfig,
    pub migrations: MigrationConfig,
}

impl PostgresConfig {
    /// Read `DATABASE_URL` plus the optional `SENSORING_DB_*` overrides:
    ///
    /// - `SENSORING_DB_MAX_CONNECTIONS`
    /// - `SENSORING_DB_ACQUIRE_TIMEOUT_SECS`
    /// - `SENSORING_DB_AUTO_MIGRATE` (`true`/`false`, `1`/`0`, `yes`/`no`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL".into()))?;
        let mut config = Self::new(database_url)?;

        if let Some(max) = env_parsed::<u32>("SENSORING_DB_MAX_CONNECTIONS")? {
            config.pool.max_connections = max;
        }
        if let Some(secs) = env_parsed::<u64>("SENSORING_DB_ACQUIRE_TIMEOUT_SECS")? {
            config.pool.acquire_timeout = Duration::from_secs(secs);
        }
        if let Ok(raw) = env::var("SENSORING_DB_AUTO_MIGRATE") {
            config.migrations.auto_run =
                parse_flag(&raw).ok_or_else(|| ConfigError::Invalid {
                    key: "SENSORING_DB_AUTO_MIGRATE".into(),
                    reason: format!("'{}' is not a boolean", raw),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Settings for `database_url` with default pool sizing
    pub fn new(database_url: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            database_url: database_url.into(),
            pool: PoolConfig::default(),
            migrations: MigrationConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database_url".into(),
                reason: "cannot be empty".into(),
            });
        }
        self.pool.validate()
    }

    /// The URL with any password replaced, for logs
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.database_url.split_once("://") else {
            return self.database_url.clone();
        };
        match rest.split_once('@') {
            Some((credentials, host)) => {
                let user = credentials.split(':').next().unwrap_or_default();
                format!("{}://{}:***@{}", scheme, user, host)
            }
            None => self.database_url.clone(),
        }
    }
}

/// Pool sizing and connection lifetimes
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(10 * 60),
            max_lifetime: Duration::from_secs(30 * 60),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "SENSORING_DB_MAX_CONNECTIONS".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid {
                key: "SENSORING_DB_MAX_CONNECTIONS".into(),
                reason: format!(
                    "{} is below the minimum of {} connections",
                    self.max_connections, self.min_connections
                ),
            });
        }
        Ok(())
    }
}

/// Whether the embedded schema is applied at startup
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub auto_run: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self { auto_run: true }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("'{}' is not a number", raw),
        }),
        Err(_) => Ok(None),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
