//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_DATA_DIR` - Directory for persisted state (default: .zapastyle)
//! - `STOREFRONT_CATALOG_PATH` - Product catalog JSON (default: data/catalog.json)
//! - `STOREFRONT_CART_KEY` - Storage key for the cart (default: zapaStyle_cart)
//! - `STOREFRONT_STORAGE_QUOTA_BYTES` - Storage quota (default: 5242880)
//! - `STOREFRONT_CURRENCY` - ISO 4217 display currency (default: PEN)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;

use thiserror::Error;
use zapastyle_core::CurrencyCode;

use crate::cart::DEFAULT_CART_KEY;
use crate::storage::{DEFAULT_QUOTA_BYTES, is_portable_key};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Directory holding persisted state
    pub data_dir: PathBuf,
    /// Product catalog file
    pub catalog_path: PathBuf,
    /// Storage key for the cart
    pub cart_key: String,
    /// Maximum bytes of keys plus values in in-memory storage
    pub storage_quota_bytes: usize,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "development")
    pub sentry_environment: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".zapastyle"),
            catalog_path: PathBuf::from("data/catalog.json"),
            cart_key: DEFAULT_CART_KEY.to_string(),
            storage_quota_bytes: DEFAULT_QUOTA_BYTES,
            currency: CurrencyCode::default(),
            sentry_dsn: None,
            sentry_environment: None,
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
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let storage_quota_bytes = match get("STOREFRONT_STORAGE_QUOTA_BYTES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "STOREFRONT_STORAGE_QUOTA_BYTES".to_string(),
                    e.to_string(),
                )
            })?,
            None => defaults.storage_quota_bytes,
        };
        let currency = match get("STOREFRONT_CURRENCY") {
            Some(raw) => raw.parse::<CurrencyCode>().map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_CURRENCY".to_string(), e.to_string())
            })?,
            None => defaults.currency,
        };

        let cart_key = match get("STOREFRONT_CART_KEY") {
            Some(key) if is_portable_key(&key) => key,
            Some(key) => {
                return Err(ConfigError::InvalidEnvVar(
                    "STOREFRONT_CART_KEY".to_string(),
                    format!("{key:?} may only contain ASCII letters, digits, '_' and '-'"),
                ));
            }
            None => defaults.cart_key,
        };

        Ok(Self {
            data_dir: get("STOREFRONT_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            catalog_path: get("STOREFRONT_CATALOG_PATH").map_or(defaults.catalog_path, PathBuf::from),
            cart_key,
            storage_quota_bytes,
            currency,
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }
}
