//! Application configuration loaded from environment variables.
//!
//! All values are read once at startup and cached in memory.

use std::env;

/// Default daily step goal for new profiles.
pub const DEFAULT_STEP_GOAL: u32 = 10_000;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    /// Base URL of the platform health service
    pub health_api_base_url: String,
    /// Service credential for the platform health service
    pub health_api_token: String,
    /// Request timeout for health-service calls (seconds)
    pub health_timeout_secs: u64,
    /// Poll interval for the foregrounded health sync task (milliseconds)
    pub health_poll_interval_ms: u64,

    /// Debounce window for step-snapshot persistence (milliseconds)
    pub persist_debounce_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),

            health_api_base_url: env::var("HEALTH_API_BASE_URL")
                .map_err(|_| ConfigError::Missing("HEALTH_API_BASE_URL"))?,
            health_api_token: env::var("HEALTH_API_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("HEALTH_API_TOKEN"))?,
            health_timeout_secs: env::var("HEALTH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            health_poll_interval_ms: env::var("HEALTH_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1_000),

            persist_debounce_ms: env::var("PERSIST_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2_000),
        })
    }

    /// Default config for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            health_api_base_url: "http://localhost:9999".to_string(),
            health_api_token: "test_health_token".to_string(),
            health_timeout_secs: 1,
            health_poll_interval_ms: 50,
            persist_debounce_ms: 20,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_default_is_usable() {
        let config = Config::test_default();
        assert_eq!(config.port, 8080);
        assert!(config.jwt_signing_key.len() >= 32);
        assert!(config.persist_debounce_ms < 1_000); // keep tests fast
    }
}
