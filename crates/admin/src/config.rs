//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DASHBOARD_API_URL` - Base URL of the serverless dashboard API (PIN verification)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `DASHBOARD_API_KEY` - Bearer token sent to the dashboard API
//! - `DASHBOARD_API_TIMEOUT_SECONDS` - Per-request timeout for the dashboard API (default: 10)
//! - `ADMIN_DATA_DIR` - Directory for durable visitor data (default: data)
//! - `PIN_IDLE_TIMEOUT_MINUTES` - Inactivity before the PIN grant expires (default: 30)
//! - `PIN_EXPIRY_CHECK_SECONDS` - Period of the expiry check (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_IDLE_TIMEOUT_MINUTES: u64 = 30;
const DEFAULT_EXPIRY_CHECK_SECONDS: u64 = 60;
const DEFAULT_API_TIMEOUT_SECONDS: u64 = 10;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "xxx",
    "todo",
    "insert",
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

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Serverless dashboard API configuration
    pub dashboard_api: DashboardApiConfig,
    /// PIN session timing
    pub pin_session: PinSessionConfig,
    /// Directory holding the durable visitor store
    pub data_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Serverless dashboard API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct DashboardApiConfig {
    /// Base URL, e.g. `https://api.example.net/prod`
    pub base_url: Url,
    /// Optional bearer token
    pub api_key: Option<SecretString>,
    /// Upper bound on a whole request, body included
    pub request_timeout: Duration,
}

impl std::fmt::Debug for DashboardApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Timing of the PIN-gated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinSessionConfig {
    /// Inactivity after which an unlocked session locks again
    pub idle_timeout: Duration,
    /// Period of the background expiry check
    pub check_interval: Duration,
}

impl Default for PinSessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_MINUTES * 60),
            check_interval: Duration::from_secs(DEFAULT_EXPIRY_CHECK_SECONDS),
        }
    }
}

impl AdminConfig {
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

        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;

        let dashboard_api = DashboardApiConfig::from_env()?;
        let pin_session = PinSessionConfig::from_env()?;
        let data_dir = PathBuf::from(get_env_or_default("ADMIN_DATA_DIR", "data"));

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            dashboard_api,
            pin_session,
            data_dir,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Path of the durable visitor store file.
    #[must_use]
    pub fn visitor_store_path(&self) -> PathBuf {
        self.data_dir.join("visitors.json")
    }
}

impl DashboardApiConfig {
    /// Load the dashboard API settings.
    ///
    /// A weak-looking `DASHBOARD_API_KEY` only produces a warning; the
    /// upstream API is the authority on whether the key works.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `DASHBOARD_API_URL` is missing or not a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("DASHBOARD_API_URL")?;
        let base_url = Url::parse(&raw).map_err(|e| {
            ConfigError::InvalidEnvVar("DASHBOARD_API_URL".to_string(), e.to_string())
        })?;

        let api_key = get_optional_env("DASHBOARD_API_KEY").map(|key| {
            if let Err(e) = validate_secret_strength(&key, "DASHBOARD_API_KEY") {
                tracing::warn!("DASHBOARD_API_KEY validation warning: {e}");
            }
            SecretString::from(key)
        });

        let timeout_seconds = parse_positive(
            "DASHBOARD_API_TIMEOUT_SECONDS",
            &get_env_or_default(
                "DASHBOARD_API_TIMEOUT_SECONDS",
                &DEFAULT_API_TIMEOUT_SECONDS.to_string(),
            ),
        )?;

        Ok(Self {
            base_url,
            api_key,
            request_timeout: Duration::from_secs(timeout_seconds),
        })
    }

    /// Settings for `base_url` with no key and the default timeout.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECONDS),
        }
    }
}

impl PinSessionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let idle_minutes = parse_positive(
            "PIN_IDLE_TIMEOUT_MINUTES",
            &get_env_or_default(
                "PIN_IDLE_TIMEOUT_MINUTES",
                &DEFAULT_IDLE_TIMEOUT_MINUTES.to_string(),
            ),
        )?;
        let check_seconds = parse_positive(
            "PIN_EXPIRY_CHECK_SECONDS",
            &get_env_or_default(
                "PIN_EXPIRY_CHECK_SECONDS",
                &DEFAULT_EXPIRY_CHECK_SECONDS.to_string(),
            ),
        )?;

        Ok(Self {
            idle_timeout: Duration::from_secs(idle_minutes.saturating_mul(60)),
            check_interval: Duration::from_secs(check_seconds),
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
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a strictly positive integer setting.
fn parse_positive(key: &str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        )),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
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
    let len = s.chars().count() as f64;
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

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
