use std::env;
use std::path::PathBuf;

/// API server configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    pub database_url: Option<String>,
    pub passwords: Passwords,
    /// Optional TOML file with detection, enrichment and weather settings
    pub config_path: Option<PathBuf>,
}

/// Shared secrets checked against the `X-Api-Password` header
#[derive(Clone, Default)]
pub struct Passwords {
    pub read: Option<String>,
    pub write: Option<String>,
}

impl std::fmt::Debug for Passwords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Passwords")
            .field("read", &self.read.as_ref().map(|_| "***"))
            .field("write", &self.write.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Passwords {
    pub fn new(read: impl Into<String>, write: impl Into<String>) -> Self {
        Self {
            read: Some(read.into()),
            write: Some(write.into()),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = env::var("SENSORING_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3001);

        let cors_origin = env::var("SENSORING_CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let database_url = non_empty_var("DATABASE_URL");

        let passwords = Passwords {
            read: non_empty_var("SENSORING_READ_PASSWORD"),
            write: non_empty_var("SENSORING_WRITE_PASSWORD"),
        };

        let config_path = non_empty_var("SENSORING_CONFIG").map(PathBuf::from);

        Self {
            port,
            cors_origin,
            database_url,
            passwords,
            config_path,
        }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Check if PostgreSQL storage is configured
    pub fn uses_postgres(&self) -> bool {
        self.database_url.is_some()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passwords_are_redacted() {
        let passwords = Passwords::new("reader", "writer");
        let debug = format!("{:?}", passwords);
        assert!(!debug.contains("reader"));
        assert!(!debug.contains("writer"));
    }

    #[test]
    fn test_bind_address() {
        let config = ApiConfig {
            port: 8080,
            ..ApiConfig::default()
        };
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(!config.uses_postgres());
    }
}
