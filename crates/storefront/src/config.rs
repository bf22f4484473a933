//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FRESHCART_BACKEND_URL` - Base URL of the grocery REST backend
//!
//! ## Optional
//! - `FRESHCART_HOST` - Bind address (default: 127.0.0.1)
//! - `FRESHCART_PORT` - Listen port (default: 3000)
//! - `FRESHCART_BASE_URL` - Public URL of this service (default: http://localhost:3000)
//! - `FRESHCART_BACKEND_TOKEN` - Bearer token for the backend (validated when set)
//! - `FRESHCART_BACKEND_TIMEOUT_SECS` - Per-request backend timeout (default: 10)
//! - `FRESHCART_GEO_SOFT_TIMEOUT_SECS` - Seconds before manual pincode entry is suggested (default: 8)
//! - `FRESHCART_GEO_HARD_TIMEOUT_SECS` - Seconds before location detection fails (default: 15)
//! - `FRESHCART_LOCATION_MAX_AGE_HOURS` - Saved location age that forces revalidation (default: 24)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Grocery backend configuration
    pub backend: BackendConfig,
    /// Location detection and revalidation tuning
    pub location: LocationConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Grocery backend API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://api.freshcart.in/api`
    pub base_url: String,
    /// Optional bearer token sent with every request
    pub api_token: Option<SecretString>,
    /// Overall per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Location detection configuration.
#[derive(Debug, Clone, Copy)]
pub struct LocationConfig {
    /// After this long, the visitor is offered manual pincode entry.
    pub soft_timeout: Duration,
    /// After this long, detection gives up.
    pub hard_timeout: Duration,
    /// Saved location older than this is always revalidated on load.
    pub max_age: chrono::Duration,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            soft_timeout: Duration::from_secs(8),
            hard_timeout: Duration::from_secs(15),
            max_age: chrono::Duration::hours(24),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the backend token fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("FRESHCART_HOST", "127.0.0.1")?;
        let port = parse_env("FRESHCART_PORT", "3000")?;
        let base_url = get_env_or_default("FRESHCART_BASE_URL", "http://localhost:3000");

        let backend = BackendConfig::from_env()?;
        let location = LocationConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            location,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked secure.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    /// Load backend settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is missing or malformed, the
    /// timeout is not a number, or the token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("FRESHCART_BACKEND_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("FRESHCART_BACKEND_URL".to_string(), e.to_string())
        })?;

        let api_token = match get_optional_env("FRESHCART_BACKEND_TOKEN") {
            Some(token) => {
                validate_secret_strength(&token, "FRESHCART_BACKEND_TOKEN")?;
                Some(SecretString::from(token))
            }
            None => None,
        };

        let timeout_secs: u64 = parse_env("FRESHCART_BACKEND_TIMEOUT_SECS", "10")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Configuration pointing at a backend without a token.
    #[must_use]
    pub fn for_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl LocationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let soft: u64 = parse_env("FRESHCART_GEO_SOFT_TIMEOUT_SECS", "8")?;
        let hard: u64 = parse_env("FRESHCART_GEO_HARD_TIMEOUT_SECS", "15")?;
        let max_age_hours: i64 = parse_env("FRESHCART_LOCATION_MAX_AGE_HOURS", "24")?;

        if hard <= soft {
            return Err(ConfigError::InvalidEnvVar(
                "FRESHCART_GEO_HARD_TIMEOUT_SECS".to_string(),
                format!("must be greater than the soft timeout ({soft}s)"),
            ));
        }

        Ok(Self {
            soft_timeout: Duration::from_secs(soft),
            hard_timeout: Duration::from_secs(hard),
            max_age: chrono::Duration::hours(max_age_hours),
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

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
            ),
        ));
    }

    Ok(())
}
