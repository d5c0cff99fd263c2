//! Marketplace configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MARKET_BASE_URL` - Public URL of the service (https enables secure cookies)
//!
//! ## Optional
//! - `MARKET_HOST` - Bind address (default: 127.0.0.1)
//! - `MARKET_PORT` - Listen port (default: 3000)
//! - `MARKET_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` snapshot store
//! - `MARKET_DATA_DIR` - JSON snapshot directory when no database is set (default: data)
//! - `MARKET_SHIPPING_FALLBACK_FEE` - Fee for carts whose seller is unknown (default: 0.60)
//! - `MARKET_AUTH_RATE_LIMIT` - Rate limit `/auth` routes per client IP (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 1.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

use harvest_hub_core::Money;

use crate::services::ShippingRates;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Marketplace service configuration.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone)]
pub struct MarketConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// `PostgreSQL` URL for snapshots (contains password)
    pub database_url: Option<SecretString>,
    /// Directory for JSON snapshots when no database is configured
    pub data_dir: PathBuf,
    /// Shipping fee charged when a cart's seller cannot be resolved
    pub shipping_fallback_fee: Money,
    /// Whether `/auth` routes are rate limited
    pub auth_rate_limit: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 - 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for MarketConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("data_dir", &self.data_dir)
            .field("shipping_fallback_fee", &self.shipping_fallback_fee)
            .field("auth_rate_limit", &self.auth_rate_limit)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .field("sentry_sample_rate", &self.sentry_sample_rate)
            .field("sentry_traces_sample_rate", &self.sentry_traces_sample_rate)
            .finish()
    }
}

impl MarketConfig {
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

        let host = parse_var::<IpAddr>("MARKET_HOST", &get_env_or_default("MARKET_HOST", "127.0.0.1"))?;
        let port = parse_var::<u16>("MARKET_PORT", &get_env_or_default("MARKET_PORT", "3000"))?;
        let base_url = get_required_env("MARKET_BASE_URL")?;
        let database_url = get_database_url("MARKET_DATABASE_URL");
        let data_dir = PathBuf::from(get_env_or_default("MARKET_DATA_DIR", "data"));
        let shipping_fallback_fee = parse_fee(
            "MARKET_SHIPPING_FALLBACK_FEE",
            &get_env_or_default("MARKET_SHIPPING_FALLBACK_FEE", "0.60"),
        )?;
        let auth_rate_limit = parse_flag(
            "MARKET_AUTH_RATE_LIMIT",
            &get_env_or_default("MARKET_AUTH_RATE_LIMIT", "true"),
        )?;

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
            base_url,
            database_url,
            data_dir,
            shipping_fallback_fee,
            auth_rate_limit,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Configuration for tests and local tools: no database, no Sentry.
    #[must_use]
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            database_url: None,
            data_dir: data_dir.into(),
            shipping_fallback_fee: ShippingRates::default().fallback_fee,
            auth_rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    /// Storage settings only, for operator tooling that never serves HTTP.
    ///
    /// Reads the database URL, data directory and fallback fee; everything
    /// else comes from [`MarketConfig::local`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the fallback fee is malformed.
    pub fn storage_from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut config = Self::local(get_env_or_default("MARKET_DATA_DIR", "data"));
        config.database_url = get_database_url("MARKET_DATABASE_URL");
        config.shipping_fallback_fee = parse_fee(
            "MARKET_SHIPPING_FALLBACK_FEE",
            &get_env_or_default("MARKET_SHIPPING_FALLBACK_FEE", "0.60"),
        )?;
        Ok(config)
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub const fn shipping_rates(&self) -> ShippingRates {
        ShippingRates {
            fallback_fee: self.shipping_fallback_fee,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a non-negative fee in the reference currency.
fn parse_fee(key: &str, value: &str) -> Result<Money, ConfigError> {
    let amount = parse_var::<Decimal>(key, value)?;
    if amount.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "fee must not be negative".to_string(),
        ));
    }
    Ok(Money::new(amount).round_to_cents())
}

/// Parse a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`).
fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got {other:?}"),
        )),
    }
}
