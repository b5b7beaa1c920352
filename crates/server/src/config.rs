//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3003)
//! - `STATIC_DIR` - Directory holding the bundled app (default: dist)
//! - `INDEX_FILE` - Entry document inside `STATIC_DIR` (default: index.html)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origins; unset allows any origin
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Environment name reported to Sentry

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3003;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Static server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory served as the site root
    pub static_dir: PathBuf,
    /// Document served for `/` and for client-side routes
    pub index_file: String,
    /// Allowed CORS origins; `None` allows any
    pub cors_allowed_origins: Option<Vec<String>>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("dist"),
            index_file: "index.html".to_owned(),
            cors_allowed_origins: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `HOST` or `PORT` cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let host = get_optional_env("HOST")
            .map(|raw| {
                raw.parse::<IpAddr>()
                    .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))
            })
            .transpose()?
            .unwrap_or(defaults.host);
        let port = get_optional_env("PORT")
            .map(|raw| {
                raw.parse::<u16>()
                    .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))
            })
            .transpose()?
            .unwrap_or(defaults.port);

        Ok(Self {
            host,
            port,
            static_dir: get_optional_env("STATIC_DIR").map_or(defaults.static_dir, PathBuf::from),
            index_file: get_env_or_default("INDEX_FILE", &defaults.index_file),
            cors_allowed_origins: get_optional_env("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw)),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Path of the index document.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.static_dir.join(&self.index_file)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional, non-empty environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}
