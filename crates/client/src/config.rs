//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CARTWHEEL_API_URL` - Base URL of the storefront API, including the
//!   `/api` path (e.g., `http://localhost:8081/api`)
//!
//! ## Optional
//! - `CARTWHEEL_API_TOKEN` - Bearer token for an already-signed-in account
//! - `CARTWHEEL_STATE_FILE` - Path of the local state file
//!   (default: `.cartwheel/state.json`)
//! - `CARTWHEEL_PAGE_SIZE` - Catalog page size (default: 20)
//! - `CARTWHEEL_SEARCH_DEBOUNCE_MS` - Quiet period before a search term is
//!   applied, in milliseconds (default: 500)
//! - `CARTWHEEL_ORDER_POLL_SECS` - Interval between order-status refreshes,
//!   in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::catalog::DEFAULT_PAGE_SIZE;
use crate::catalog::debounce::DEFAULT_QUIET_PERIOD;
use crate::orders::DEFAULT_POLL_INTERVAL;

/// Default location of the persisted client-side state.
pub const DEFAULT_STATE_FILE: &str = ".cartwheel/state.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront API (includes the `/api` path)
    pub api_url: Url,
    /// Bearer token for an already-signed-in account, if any
    pub api_token: Option<SecretString>,
    /// Path of the local state file (token, user, offline cart, promo)
    pub state_file: PathBuf,
    /// Catalog page size
    pub page_size: usize,
    /// Quiet period before a search term is applied
    pub search_debounce: Duration,
    /// Interval between order-status refreshes
    pub order_poll_interval: Duration,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the API URL.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            api_token: None,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: DEFAULT_QUIET_PERIOD,
            order_poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CARTWHEEL_API_URL` is missing or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_required_env("CARTWHEEL_API_URL")?;
        let api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CARTWHEEL_API_URL".to_string(), e.to_string())
        })?;
        let api_token = get_optional_env("CARTWHEEL_API_TOKEN").map(SecretString::from);
        let state_file =
            PathBuf::from(get_env_or_default("CARTWHEEL_STATE_FILE", DEFAULT_STATE_FILE));
        let page_size = parse_env("CARTWHEEL_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let search_debounce = Duration::from_millis(parse_env(
            "CARTWHEEL_SEARCH_DEBOUNCE_MS",
            u64::try_from(DEFAULT_QUIET_PERIOD.as_millis()).unwrap_or(500),
        )?);
        let order_poll_interval = Duration::from_secs(parse_env(
            "CARTWHEEL_ORDER_POLL_SECS",
            DEFAULT_POLL_INTERVAL.as_secs(),
        )?);

        Ok(Self {
            api_url,
            api_token,
            state_file,
            page_size,
            search_debounce,
            order_poll_interval,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_defaults() {
        let config = ClientConfig::new(Url::parse("http://localhost:8081/api").unwrap());
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.search_debounce, Duration::from_millis(500));
        assert_eq!(config.order_poll_interval, Duration::from_secs(30));
        assert_eq!(config.state_file, PathBuf::from(DEFAULT_STATE_FILE));
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_missing_env_var_message() {
        let err = ConfigError::MissingEnvVar("CARTWHEEL_API_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: CARTWHEEL_API_URL"
        );
    }

    #[test]
    fn test_invalid_env_var_message() {
        let err = ConfigError::InvalidEnvVar("CARTWHEEL_PAGE_SIZE".to_string(), "bad".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid environment variable CARTWHEEL_PAGE_SIZE: bad"
        );
    }
}
