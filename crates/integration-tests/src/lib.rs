//! Integration tests for ZapaStyle.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p zapastyle-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - Cart changes shared between browsing contexts
//! - `persistence` - State surviving a restart on file storage
//! - `storefront_flow` - Browsing, cart and checkout end to end
//!
//! Shared fixtures live in this crate so every test file builds the same
//! catalog.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use rust_decimal::Decimal;
use zapastyle_core::ProductId;
use zapastyle_storefront::catalog::{Catalog, InMemoryCatalog, Product};

/// Catalog file shipped with the repository.
pub const CATALOG_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/catalog.json");

/// Build a product with a whole-number price.
#[must_use]
pub fn product(id: i32, name: &str, price: i64, category: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Decimal::new(price, 0),
        category: category.to_string(),
        image: format!("images/product-{id}.jpg"),
    }
}

/// Small catalog used across the integration tests.
///
/// # Panics
///
/// Panics if the fixture products are invalid.
#[must_use]
pub fn test_catalog() -> Arc<InMemoryCatalog> {
    Arc::new(
        InMemoryCatalog::from_products(vec![
            product(1, "Urban Sneaker", 120, "urban"),
            product(2, "Running Shoe", 150, "sport"),
            product(3, "Sport Sneaker", 65, "sport"),
            product(4, "Casual Shoe", 50, "casual"),
            product(5, "Trail Boot", 85, "outdoor"),
        ])
        .expect("fixture catalog is valid"),
    )
}

/// [`test_catalog`] as a trait object.
#[must_use]
pub fn dyn_catalog() -> Arc<dyn Catalog> {
    test_catalog()
}
