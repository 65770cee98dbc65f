//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `POKESTORE_API_URL` - Base URL of the remote API
//!
//! ## Optional
//! - `POKESTORE_DATA_DIR` - Directory for persisted client state (default: .pokestore)
//! - `POKESTORE_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `POKESTORE_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 60)
//! - `POKESTORE_ENFORCE_TOKEN_EXPIRY` - Reject expired tokens locally (default: true)
//! - `POKESTORE_FALLBACK_IMAGE` - Image for products without one
//!   (default: app/assets/img/pokeball.webp)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::catalog::DEFAULT_FALLBACK_IMAGE;

const DEFAULT_DATA_DIR: &str = ".pokestore";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "10";
const DEFAULT_CATALOG_CACHE_TTL_SECS: &str = "60";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Base URL of the remote API
    pub api_url: Url,
    /// Directory holding the file-backed client storage
    pub data_dir: PathBuf,
    /// Timeout applied to every remote request
    pub http_timeout: Duration,
    /// How long a fetched catalog listing is reused
    pub catalog_cache_ttl: Duration,
    /// Whether expired bearer tokens are rejected without asking the server
    pub enforce_token_expiry: bool,
    /// Image used for products the backend has no image for
    pub fallback_image: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let api_url = env.required("POKESTORE_API_URL")?;
        let api_url = Url::parse(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("POKESTORE_API_URL".to_string(), e.to_string()))?;
        if api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "POKESTORE_API_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            data_dir: PathBuf::from(env.or_default("POKESTORE_DATA_DIR", DEFAULT_DATA_DIR)),
            http_timeout: env.seconds("POKESTORE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            catalog_cache_ttl: env
                .seconds("POKESTORE_CATALOG_CACHE_TTL_SECS", DEFAULT_CATALOG_CACHE_TTL_SECS)?,
            enforce_token_expiry: env.flag("POKESTORE_ENFORCE_TOKEN_EXPIRY", true)?,
            fallback_image: env.or_default("POKESTORE_FALLBACK_IMAGE", DEFAULT_FALLBACK_IMAGE),
            sentry_dsn: env.optional("SENTRY_DSN"),
        })
    }

    /// Configuration pointing at `api_url` with every optional value at its default.
    #[must_use]
    pub fn with_api_url(api_url: Url) -> Self {
        Self {
            api_url,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            http_timeout: Duration::from_secs(10),
            catalog_cache_ttl: Duration::from_secs(60),
            enforce_token_expiry: true,
            fallback_image: DEFAULT_FALLBACK_IMAGE.to_string(),
            sentry_dsn: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable; blank counts as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// A positive whole number of seconds.
    fn seconds(&self, key: &str, default: &str) -> Result<Duration, ConfigError> {
        let secs = self
            .or_default(key, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        Ok(Duration::from_secs(secs))
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = self.optional(key) else {
            return Ok(default);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected true or false, got {other:?}"),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("POKESTORE_API_URL", "http://localhost:3000")]).unwrap();

        assert_eq!(config.api_url.as_str(), "http://localhost:3000/");
        assert_eq!(config.data_dir, PathBuf::from(".pokestore"));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.catalog_cache_ttl, Duration::from_secs(60));
        assert!(config.enforce_token_expiry);
        assert_eq!(config.fallback_image, "app/assets/img/pokeball.webp");
        assert!(config.sentry_dsn.is_none());
        assert_eq!(config, StorefrontConfig::with_api_url(config.api_url.clone()));
    }

    #[test]
    fn test_missing_api_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "POKESTORE_API_URL"));
    }

    #[test]
    fn test_invalid_api_url() {
        let err = load(&[("POKESTORE_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "POKESTORE_API_URL"));

        let err = load(&[("POKESTORE_API_URL", "mailto:ash@pallet.town")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("POKESTORE_API_URL", "https://api.pokestore.cl/api"),
            ("POKESTORE_DATA_DIR", "/tmp/pokestore"),
            ("POKESTORE_HTTP_TIMEOUT_SECS", "3"),
            ("POKESTORE_CATALOG_CACHE_TTL_SECS", "300"),
            ("POKESTORE_ENFORCE_TOKEN_EXPIRY", "false"),
            ("POKESTORE_FALLBACK_IMAGE", "/img/none.png"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
        ])
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/pokestore"));
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.catalog_cache_ttl, Duration::from_secs(300));
        assert!(!config.enforce_token_expiry);
        assert_eq!(config.fallback_image, "/img/none.png");
        assert_eq!(config.sentry_dsn.as_deref(), Some("https://key@sentry.example/1"));
    }

    #[test]
    fn test_invalid_numbers() {
        let err = load(&[
            ("POKESTORE_API_URL", "http://localhost"),
            ("POKESTORE_HTTP_TIMEOUT_SECS", "ten"),
        ])
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "POKESTORE_HTTP_TIMEOUT_SECS")
        );

        let err = load(&[
            ("POKESTORE_API_URL", "http://localhost"),
            ("POKESTORE_CATALOG_CACHE_TTL_SECS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_flag() {
        let err = load(&[
            ("POKESTORE_API_URL", "http://localhost"),
            ("POKESTORE_ENFORCE_TOKEN_EXPIRY", "maybe"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = load(&[
            ("POKESTORE_API_URL", "http://localhost"),
            ("POKESTORE_DATA_DIR", "  "),
            ("SENTRY_DSN", ""),
        ])
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from(".pokestore"));
        assert!(config.sentry_dsn.is_none());
    }
}
