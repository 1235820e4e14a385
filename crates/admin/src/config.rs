//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL for the admin API
//! - `ADMIN_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `ADMIN_EMAIL` - Operator login email
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC hash of the operator password (`opal admin hash-password`)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ORDER_STATUS_CORRECTIONS` - Allow backward status moves (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - 0.0 to 1.0 (default: 1.0)

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};

use argon2::password_hash::PasswordHash;
use opal_core::Email;
use opal_core::lifecycle::TransitionPolicy;
use secrecy::SecretString;
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL for the admin API
    pub base_url: String,
    pub session_secret: SecretString,
    /// The single operator account
    pub credentials: AdminCredentials,
    /// Whether operators may move orders backward through the lifecycle
    pub allow_status_corrections: bool,
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Operator login credentials.
///
/// Implements `Debug` manually to redact the password hash.
#[derive(Clone)]
pub struct AdminCredentials {
    pub email: Email,
    /// Argon2 PHC string
    pub password_hash: SecretString,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl AdminCredentials {
    fn from_env() -> Result<Self, ConfigError> {
        let email = Email::parse(&get_required_env("ADMIN_EMAIL")?)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_EMAIL".to_string(), e.to_string()))?;

        let password_hash = get_required_env("ADMIN_PASSWORD_HASH")?;
        PasswordHash::new(&password_hash).map_err(|e| {
            ConfigError::InvalidEnvVar(
                "ADMIN_PASSWORD_HASH".to_string(),
                format!("not an Argon2 PHC string ({e}); generate one with `opal admin hash-password`"),
            )
        })?;

        Ok(Self {
            email,
            password_hash: SecretString::from(password_hash),
        })
    }
}

impl AdminConfig {
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

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;
        let session_secret = get_session_secret("ADMIN_SESSION_SECRET")?;

        let credentials = AdminCredentials::from_env()?;
        let allow_status_corrections = parse_bool(
            "ORDER_STATUS_CORRECTIONS",
            &get_env_or_default("ORDER_STATUS_CORRECTIONS", "false"),
        )?;

        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            credentials,
            allow_status_corrections,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The order status transition policy in force.
    #[must_use]
    pub const fn transition_policy(&self) -> TransitionPolicy {
        if self.allow_status_corrections {
            TransitionPolicy::with_corrections()
        } else {
            TransitionPolicy::strict()
        }
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
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

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected true or false, got '{other}'"),
        )),
    }
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

/// A valid configuration for handler tests.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn test_config() -> AdminConfig {
    AdminConfig {
        database_url: SecretString::from("postgres://localhost/test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 3001,
        base_url: "http://localhost:3001".to_string(),
        session_secret: SecretString::from("x".repeat(32)),
        credentials: AdminCredentials {
            email: Email::parse("ops@opal.test").unwrap(),
            password_hash: SecretString::from("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"),
        },
        allow_status_corrections: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use opal_core::OrderStatus;

    use super::*;

    #[test]
    fn test_uniform_secret_has_no_entropy() {
        assert!(bits_per_char(&"a".repeat(40)).abs() < f64::EPSILON);
        assert!(check_session_secret("TEST_VAR", &"a".repeat(40)).is_err());
    }

    #[test]
    fn test_placeholder_secret_is_rejected() {
        let result = check_session_secret("TEST_VAR", "changeme-Z8q!k2Lp#r5Tw9Vx3Nb7Hd0Jf");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_random_secret_is_accepted() {
        assert!(check_session_secret("TEST_VAR", "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6Dq").is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_transition_policy_follows_flag() {
        let mut config = test_config();
        let strict = config.transition_policy();
        assert!(!strict.permits(OrderStatus::Delivered, OrderStatus::Pending));

        config.allow_status_corrections = true;
        let lenient = config.transition_policy();
        assert!(lenient.permits(OrderStatus::Delivered, OrderStatus::Pending));
        assert!(!lenient.permits(OrderStatus::Cancelled, OrderStatus::Pending));
    }

    #[test]
    fn test_credentials_debug_redacts_hash() {
        let debug_output = format!("{:?}", test_config().credentials);
        assert!(debug_output.contains("ops@opal.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("argon2id"));
    }
}
