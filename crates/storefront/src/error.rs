//! Unified error type for callers driving the whole storefront.
//!
//! Individual services return their own error types; `StorefrontError`
//! collects them so front ends can use a single `Result`.

use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::{CatalogError, ProductNotFound};
use crate::config::ConfigError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Not found: {0}")]
    NotFound(#[from] ProductNotFound),
}

impl StorefrontError {
    /// Whether the error was caused by the caller's input rather than the
    /// environment.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::Cart(_) | Self::NotFound(_))
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
