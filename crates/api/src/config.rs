//! Application configuration loaded from environment variables.

use std::time::Duration;

use saga::RetryPolicy;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `PROVIDER_BASE_URL` — scheduling provider base URL
/// - `PROVIDER_API_KEY` — scheduling provider API key
/// - `DATABASE_URL` — Postgres URL; in-memory store when unset
/// - `RESERVE_MAX_ATTEMPTS` — reservation retry ceiling (default: 3)
/// - `RESERVE_RETRY_DELAY_SECS` — gap between attempts (default: 2)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub provider_base_url: String,
    pub provider_api_key: String,
    pub database_url: Option<String>,
    pub reserve_max_attempts: u32,
    pub reserve_retry_delay: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            provider_base_url: std::env::var("PROVIDER_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            provider_api_key: std::env::var("PROVIDER_API_KEY").unwrap_or_default(),
            database_url: std::env::var("DATABASE_URL").ok(),
            reserve_max_attempts: std::env::var("RESERVE_MAX_ATTEMPTS")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(3),
            reserve_retry_delay: Duration::from_secs(
                std::env::var("RESERVE_RETRY_DELAY_SECS")
                    .ok()
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(2),
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the reservation retry policy from the configured knobs.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.reserve_max_attempts, self.reserve_retry_delay)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            provider_base_url: "http://localhost:8080".to_string(),
            provider_api_key: String::new(),
            database_url: None,
            reserve_max_attempts: 3,
            reserve_retry_delay: Duration::from_secs(2),
        }
    }
}
