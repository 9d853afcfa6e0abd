//! Configuration management for Bookworm.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `BOOKWORM_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use bookworm::config::Config;
//!
//! // Parse from command line and environment
//! let config = Config::parse();
//! config.validate()?;
//!
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `BOOKWORM_HOST` - Server bind address (default: 0.0.0.0)
//! - `BOOKWORM_PORT` - Server port (default: 3000)
//! - `BOOKWORM_DATABASE_URL` - PostgreSQL connection string, or `memory://` (required)
//! - `BOOKWORM_JWT_SECRET` - Token signing secret (required)
//! - `BOOKWORM_CLOUDINARY_CLOUD_NAME` / `_API_KEY` / `_API_SECRET` - Image host credentials
//! - `BOOKWORM_ENV` - `development` or `production` (default: development)
//! - `BOOKWORM_CORS_ORIGINS` - Allowed origins, comma-separated (required in production)
//! - `BOOKWORM_REQUEST_TIMEOUT` - Request timeout in seconds (default: 120)
//! - `BOOKWORM_MAX_BODY_BYTES` - Request body limit (default: 10 MiB)
//! - `BOOKWORM_KEEPALIVE_URL` - URL pinged periodically to keep the host awake
//! - `BOOKWORM_KEEPALIVE_INTERVAL` - Ping interval in seconds (default: 840)

use std::time::Duration;

use clap::{Parser, ValueEnum};
use url::Url;

use crate::image::CloudinaryConfig;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default cap on total request handling time, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default request body limit. Cover images arrive inline, so this is generous.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Default keep-alive ping interval (14 minutes).
pub const DEFAULT_KEEPALIVE_INTERVAL_SECS: u64 = 14 * 60;

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    /// Permissive CORS, detailed error messages
    Development,
    /// CORS restricted to configured origins, 5xx details redacted
    Production,
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Bookworm - a book-review catalog API.
///
/// Serves account registration/login and paginated book reviews with hosted
/// cover images.
#[derive(Parser, Debug, Clone)]
#[command(name = "bookworm")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "BOOKWORM_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "BOOKWORM_PORT")]
    pub port: u16,

    /// Deployment mode.
    #[arg(long, value_enum, default_value_t = Environment::Development, env = "BOOKWORM_ENV")]
    pub environment: Environment,

    /// Maximum time in seconds to handle one request.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, env = "BOOKWORM_REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    /// Maximum accepted request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES, env = "BOOKWORM_MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// PostgreSQL connection string, or `memory://` for a throwaway in-memory store.
    #[arg(long, env = "BOOKWORM_DATABASE_URL")]
    pub database_url: Option<String>,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret used to sign bearer tokens.
    #[arg(long, env = "BOOKWORM_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    // =========================================================================
    // Image Host Configuration
    // =========================================================================
    /// Cloudinary cloud name.
    #[arg(long, env = "BOOKWORM_CLOUDINARY_CLOUD_NAME")]
    pub cloudinary_cloud_name: Option<String>,

    /// Cloudinary API key.
    #[arg(long, env = "BOOKWORM_CLOUDINARY_API_KEY")]
    pub cloudinary_api_key: Option<String>,

    /// Cloudinary API secret.
    #[arg(long, env = "BOOKWORM_CLOUDINARY_API_SECRET", hide_env_values = true)]
    pub cloudinary_api_secret: Option<String>,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// Ignored in development, where any origin is allowed.
    #[arg(long, env = "BOOKWORM_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Keep-alive Configuration
    // =========================================================================
    /// URL to GET periodically so idle hosting platforms keep the process warm.
    #[arg(long, env = "BOOKWORM_KEEPALIVE_URL")]
    pub keepalive_url: Option<String>,

    /// Seconds between keep-alive pings.
    #[arg(long, default_value_t = DEFAULT_KEEPALIVE_INTERVAL_SECS, env = "BOOKWORM_KEEPALIVE_INTERVAL")]
    pub keepalive_interval: u64,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.as_deref().map_or(true, str::is_empty) {
            return Err(
                "Token signing secret is required. Set --jwt-secret or BOOKWORM_JWT_SECRET"
                    .to_string(),
            );
        }

        if self.database_url.as_deref().map_or(true, str::is_empty) {
            return Err(
                "Database URL is required. Set --database-url or BOOKWORM_DATABASE_URL \
                 (use memory:// for an in-memory store)"
                    .to_string(),
            );
        }

        let cloudinary_parts = [
            &self.cloudinary_cloud_name,
            &self.cloudinary_api_key,
            &self.cloudinary_api_secret,
        ];
        let provided = cloudinary_parts.iter().filter(|p| p.is_some()).count();
        if provided != 0 && provided != cloudinary_parts.len() {
            return Err(
                "Cloudinary credentials are incomplete. Set cloud name, API key and API secret \
                 together"
                    .to_string(),
            );
        }

        if self.is_production() {
            if provided == 0 {
                return Err("Cloudinary credentials are required in production".to_string());
            }
            if self.cors_origins.as_ref().map_or(true, Vec::is_empty) {
                return Err(
                    "CORS origins are required in production. Set --cors-origins or \
                     BOOKWORM_CORS_ORIGINS"
                        .to_string(),
                );
            }
        }

        if self.request_timeout == 0 {
            return Err("request_timeout must be greater than 0".to_string());
        }
        if self.max_body_bytes == 0 {
            return Err("max_body_bytes must be greater than 0".to_string());
        }
        if let Some(ref raw) = self.keepalive_url {
            let url = Url::parse(raw).map_err(|e| format!("Invalid keepalive URL: {}", e))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(format!(
                    "Keepalive URL must be http or https, got '{}'",
                    url.scheme()
                ));
            }
            if self.keepalive_interval == 0 {
                return Err("keepalive_interval must be greater than 0".to_string());
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the token secret, or "" if unset (call validate() first).
    pub fn jwt_secret_or_empty(&self) -> &str {
        self.jwt_secret.as_deref().unwrap_or("")
    }

    /// Get the database URL, or "" if unset (call validate() first).
    pub fn database_url_or_empty(&self) -> &str {
        self.database_url.as_deref().unwrap_or("")
    }

    /// Cloudinary credentials, if all three parts are configured.
    pub fn cloudinary(&self) -> Option<CloudinaryConfig> {
        match (
            &self.cloudinary_cloud_name,
            &self.cloudinary_api_key,
            &self.cloudinary_api_secret,
        ) {
            (Some(name), Some(key), Some(secret)) => {
                Some(CloudinaryConfig::new(name, key, secret))
            }
            _ => None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval)
    }
}

// =============================================================================
// Tests
// =============================================================================
