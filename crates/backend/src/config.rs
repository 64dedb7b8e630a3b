//! Backend configuration and the environment helpers shared by every binary.
//!
//! # Environment Variables
//!
//! ## Required
//! - `APPWRITE_PROJECT_ID` - Appwrite project id
//! - `APPWRITE_API_KEY` - Server API key (high entropy)
//! - `APPWRITE_DATABASE_ID` - Database holding every table
//! - `APPWRITE_STORAGE_BUCKET_ID` - Bucket for product images
//! - `APPWRITE_PRODUCTS_COLLECTION_ID`, `APPWRITE_CUSTOMERS_COLLECTION_ID`,
//!   `APPWRITE_ORDERS_COLLECTION_ID`, `APPWRITE_ORDER_ITEMS_COLLECTION_ID`,
//!   `APPWRITE_ADMIN_USERS_COLLECTION_ID`,
//!   `APPWRITE_ANALYTICS_EVENTS_COLLECTION_ID`,
//!   `APPWRITE_SESSIONS_COLLECTION_ID` - Table ids
//!
//! ## Optional
//! - `APPWRITE_ENDPOINT` - API root (default: `https://cloud.appwrite.io/v1`)

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::store::Collection;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
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

const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1";

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

/// Table id for each [`Collection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionIds {
    pub products: String,
    pub customers: String,
    pub orders: String,
    pub order_items: String,
    pub admin_users: String,
    pub analytics_events: String,
    pub sessions: String,
}

impl CollectionIds {
    #[must_use]
    pub fn id(&self, collection: Collection) -> &str {
        match collection {
            Collection::Products => &self.products,
            Collection::Customers => &self.customers,
            Collection::Orders => &self.orders,
            Collection::OrderItems => &self.order_items,
            Collection::AdminUsers => &self.admin_users,
            Collection::AnalyticsEvents => &self.analytics_events,
            Collection::Sessions => &self.sessions,
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            products: get_required_env("APPWRITE_PRODUCTS_COLLECTION_ID")?,
            customers: get_required_env("APPWRITE_CUSTOMERS_COLLECTION_ID")?,
            orders: get_required_env("APPWRITE_ORDERS_COLLECTION_ID")?,
            order_items: get_required_env("APPWRITE_ORDER_ITEMS_COLLECTION_ID")?,
            admin_users: get_required_env("APPWRITE_ADMIN_USERS_COLLECTION_ID")?,
            analytics_events: get_required_env("APPWRITE_ANALYTICS_EVENTS_COLLECTION_ID")?,
            sessions: get_required_env("APPWRITE_SESSIONS_COLLECTION_ID")?,
        })
    }
}

/// Appwrite connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// API root, e.g. `https://cloud.appwrite.io/v1`
    pub endpoint: Url,
    pub project_id: String,
    /// Server API key
    pub api_key: SecretString,
    pub database_id: String,
    /// Bucket for product images
    pub bucket_id: String,
    pub collections: CollectionIds,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .field("database_id", &self.database_id)
            .field("bucket_id", &self.bucket_id)
            .field("collections", &self.collections)
            .finish()
    }
}

impl BackendConfig {
    /// Load the Appwrite settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, the endpoint
    /// is not a URL, or the API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint_raw = get_env_or_default("APPWRITE_ENDPOINT", DEFAULT_ENDPOINT);
        let endpoint = Url::parse(endpoint_raw.trim_end_matches('/')).map_err(|e| {
            ConfigError::InvalidEnvVar("APPWRITE_ENDPOINT".to_string(), e.to_string())
        })?;

        Ok(Self {
            endpoint,
            project_id: get_required_env("APPWRITE_PROJECT_ID")?,
            api_key: get_validated_secret("APPWRITE_API_KEY")?,
            database_id: get_required_env("APPWRITE_DATABASE_ID")?,
            bucket_id: get_required_env("APPWRITE_STORAGE_BUCKET_ID")?,
            collections: CollectionIds::from_env()?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if unset.
pub fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
#[must_use]
pub fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
#[must_use]
pub fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the value does not parse.
pub fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a session secret meets minimum length requirements.
///
/// # Errors
///
/// Returns `ConfigError::InsecureSecret` for secrets under 32 characters.
pub fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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
            #[allow(clippy::cast_precision_loss)]
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
///
/// # Errors
///
/// Returns `ConfigError` if the variable is missing or fails the
/// placeholder/entropy checks.
pub fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
