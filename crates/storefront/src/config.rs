//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `ORDER_NUMBER_PREFIX` - Prefix for generated order numbers (default: OPAL)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Order number prefix used when none is configured.
pub const DEFAULT_ORDER_NUMBER_PREFIX: &str = "OPAL";

/// Substrings that give away a copied sample value (matched lowercase).
const PLACEHOLDER_WORDS: &[&str] = &[
    "changeme",
    "placeholder",
    "example",
    "secret",
    "password",
    "your-",
    "xxx",
    "opal",
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
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    pub session_secret: SecretString,
    /// Uppercase prefix of generated order numbers
    pub order_number_prefix: String,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let session_secret = get_session_secret("STOREFRONT_SESSION_SECRET")?;

        let order_number_prefix = parse_order_number_prefix(&get_env_or_default(
            "ORDER_NUMBER_PREFIX",
            DEFAULT_ORDER_NUMBER_PREFIX,
        ))
        .map_err(|reason| ConfigError::InvalidEnvVar("ORDER_NUMBER_PREFIX".to_string(), reason))?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            order_number_prefix,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Normalize and check an order number prefix: 2 to 8 ASCII letters or digits.
///
/// # Errors
///
/// Returns a description of the problem when the prefix is malformed.
pub fn parse_order_number_prefix(raw: &str) -> Result<String, String> {
    let prefix = raw.trim().to_ascii_uppercase();
    if !(2..=8).contains(&prefix.len()) {
        return Err(format!(
            "must be 2 to 8 characters (got {})",
            prefix.len()
        ));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("must contain only letters and digits".to_string());
    }
    Ok(prefix)
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a session secret, rejecting short, placeholder or low-entropy values.
fn get_session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    check_session_secret(key, &value)?;
    Ok(SecretString::from(value))
}

fn check_session_secret(key: &str, value: &str) -> Result<(), ConfigError> {
    let insecure = |reason: String| ConfigError::InsecureSecret(key.to_string(), reason);

    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(insecure(format!(
            "needs at least {MIN_SESSION_SECRET_LENGTH} characters, got {}",
            value.len()
        )));
    }

    let lower = value.to_lowercase();
    if let Some(word) = PLACEHOLDER_WORDS.iter().find(|word| lower.contains(*word)) {
        return Err(insecure(format!("looks like a placeholder (contains '{word}')")));
    }

    let entropy = bits_per_char(value);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(insecure(format!(
            "only {entropy:.2} bits of entropy per character, need {MIN_ENTROPY_BITS_PER_CHAR:.1}; generate a random value"
        )));
    }

    Ok(())
}

/// Shannon entropy of the byte distribution.
fn bits_per_char(value: &str) -> f64 {
    let mut counts: BTreeMap<u8, u32> = BTreeMap::new();
    for byte in value.bytes() {
        *counts.entry(byte).or_default() += 1;
    }

    let total = f64::from(u32::try_from(value.len()).unwrap_or(u32::MAX));
    counts
        .values()
        .map(|&count| {
            let p = f64::from(count) / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            order_number_prefix: DEFAULT_ORDER_NUMBER_PREFIX.to_string(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    const STRONG_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6Dq";

    #[test]
    fn test_bits_per_char() {
        assert!((bits_per_char("ab") - 1.0).abs() < 0.01);
        assert!(bits_per_char("").abs() < f64::EPSILON);
    }

    #[test]
    fn test_strong_secret_is_accepted() {
        assert!(check_session_secret("TEST_VAR", STRONG_SECRET).is_ok());
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let err = check_session_secret("TEST_VAR", "short").unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_placeholder_secret_is_rejected() {
        let err = check_session_secret("TEST_VAR", "your-session-key-goes-here-0123456789").unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn test_low_entropy_secret_is_rejected() {
        let err = check_session_secret("TEST_VAR", &"ab".repeat(20)).unwrap_err();
        assert!(err.to_string().contains("entropy"));
    }

    #[test]
    fn test_order_number_prefix_is_uppercased() {
        assert_eq!(parse_order_number_prefix(" shop ").unwrap(), "SHOP");
        assert_eq!(parse_order_number_prefix("B2").unwrap(), "B2");
    }

    #[test]
    fn test_order_number_prefix_rejects_bad_values() {
        assert!(parse_order_number_prefix("X").is_err());
        assert!(parse_order_number_prefix("TOOLONGPREFIX").is_err());
        assert!(parse_order_number_prefix("OP-AL").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_https() {
        let mut config = test_config();
        assert!(!config.is_https());
        config.base_url = "https://shop.example.com".to_string();
        assert!(config.is_https());
    }
}
