//! Product catalog.
//!
//! The catalog is a read-only collaborator of the cart, favorites and
//! comparison services. [`InMemoryCatalog`] serves a fixed product list
//! loaded from JSON.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zapastyle_core::ProductId;

/// Price below which a product is listed as an offer.
pub const DEFAULT_OFFER_THRESHOLD: Decimal = Decimal::from_parts(70, 0, 0, false, 0);

/// Number of products shown as featured when no limit is given.
pub const DEFAULT_FEATURED_LIMIT: usize = 4;

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    /// Relative image path.
    pub image: String,
}

impl Product {
    #[must_use]
    pub fn is_in_category(&self, category: &str) -> bool {
        self.category == category
    }

    /// Case-insensitive substring match over name and category.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        let term = query.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.category.to_lowercase().contains(&term)
    }
}

/// The referenced product does not exist in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("product not found: {0}")]
pub struct ProductNotFound(pub ProductId);

/// Errors that can occur while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog file is not a valid product list.
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Two products share an ID.
    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),

    /// A product has a negative price.
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),
}

/// Read access to the product catalog.
///
/// Only `get_all` and `get_by_id` are required; the remaining queries are
/// derived from them.
pub trait Catalog: Send + Sync {
    /// Every product, in catalog order.
    fn get_all(&self) -> Vec<Product>;

    fn get_by_id(&self, id: ProductId) -> Option<Product>;

    /// Like [`Catalog::get_by_id`], but absence is an error.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` if no product has this ID.
    fn require(&self, id: ProductId) -> Result<Product, ProductNotFound> {
        self.get_by_id(id).ok_or(ProductNotFound(id))
    }

    fn get_by_category(&self, category: &str) -> Vec<Product> {
        self.get_all()
            .into_iter()
            .filter(|p| p.is_in_category(category))
            .collect()
    }

    /// Products whose name or category contains `query`, ignoring case.
    fn search(&self, query: &str) -> Vec<Product> {
        self.get_all()
            .into_iter()
            .filter(|p| p.matches_search(query))
            .collect()
    }

    /// Distinct categories in first-seen order.
    fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.get_all()
            .into_iter()
            .filter_map(|p| seen.insert(p.category.clone()).then_some(p.category))
            .collect()
    }

    fn featured(&self, limit: usize) -> Vec<Product> {
        self.get_all().into_iter().take(limit).collect()
    }

    /// Products priced strictly below `threshold`.
    fn offers(&self, threshold: Decimal) -> Vec<Product> {
        self.get_all()
            .into_iter()
            .filter(|p| p.price < threshold)
            .collect()
    }
}

/// Catalog held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<Vec<Product>>,
}

impl InMemoryCatalog {
    /// Build a catalog from a product list.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if IDs are duplicated or a price is negative.
    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut ids = HashSet::new();
        for product in &products {
            if !ids.insert(product.id) {
                return Err(CatalogError::DuplicateId(product.id));
            }
            if product.price.is_sign_negative() {
                return Err(CatalogError::NegativePrice(product.id));
            }
        }
        Ok(Self {
            products: RwLock::new(products),
        })
    }

    /// Load a catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read, parsed or validated.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let products: Vec<Product> =
            serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(path = %path.display(), count = products.len(), "Loaded catalog");
        Self::from_products(products)
    }

    /// Reprice a product. Returns `false` if the product does not exist.
    ///
    /// Cart totals are computed from live catalog prices, so a repricing is
    /// visible in the next total.
    pub fn set_price(&self, id: ProductId, price: Decimal) -> bool {
        let mut products = self.products.write().unwrap_or_else(PoisonError::into_inner);
        match products.iter_mut().find(|p| p.id == id) {
            Some(product) => {
                product.price = price;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Catalog for InMemoryCatalog {
    fn get_all(&self) -> Vec<Product> {
        self.products.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn get_by_id(&self, id: ProductId) -> Option<Product> {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn product(id: i32, name: &str, price: i64, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            price: Decimal::new(price, 0),
            category: category.to_string(),
            image: format!("images/{id}.jpg"),
        }
    }

    /// Small catalog used across the crate's unit tests.
    pub(crate) fn sample_catalog() -> InMemoryCatalog {
        InMemoryCatalog::from_products(vec![
            product(1, "Urban Sneaker", 120, "urban"),
            product(2, "Running Shoe", 150, "sport"),
            product(3, "Sport Sneaker", 65, "sport"),
            product(4, "Casual Shoe", 50, "casual"),
            product(5, "Trail Boot", 85, "outdoor"),
        ])
        .unwrap()
    }

    #[test]
    fn test_get_by_id_and_require() {
        let catalog = sample_catalog();
        assert_eq!(catalog.get_by_id(ProductId::new(3)).unwrap().name, "Sport Sneaker");
        assert_eq!(
            catalog.require(ProductId::new(99)),
            Err(ProductNotFound(ProductId::new(99)))
        );
    }

    #[test]
    fn test_category_and_search() {
        let catalog = sample_catalog();
        let sport: Vec<_> = catalog.get_by_category("sport").iter().map(|p| p.id).collect();
        assert_eq!(sport, vec![ProductId::new(2), ProductId::new(3)]);

        let hits: Vec<_> = catalog.search("SNEAK").iter().map(|p| p.id).collect();
        assert_eq!(hits, vec![ProductId::new(1), ProductId::new(3)]);

        // Category text is searchable too
        assert_eq!(catalog.search("outdoor").len(), 1);
    }

    #[test]
    fn test_categories_first_seen_order() {
        let catalog = sample_catalog();
        assert_eq!(catalog.categories(), vec!["urban", "sport", "casual", "outdoor"]);
    }

    #[test]
    fn test_featured_and_offers() {
        let catalog = sample_catalog();
        assert_eq!(catalog.featured(DEFAULT_FEATURED_LIMIT).len(), 4);
        assert_eq!(catalog.featured(10).len(), 5);

        let offers: Vec<_> = catalog
            .offers(DEFAULT_OFFER_THRESHOLD)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(offers, vec![ProductId::new(3), ProductId::new(4)]);
    }

    #[test]
    fn test_rejects_duplicates_and_negative_prices() {
        let err = InMemoryCatalog::from_products(vec![
            product(1, "A", 10, "x"),
            product(1, "B", 20, "x"),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(id) if id == ProductId::new(1)));

        let err = InMemoryCatalog::from_products(vec![product(2, "C", -1, "x")]).unwrap_err();
        assert!(matches!(err, CatalogError::NegativePrice(_)));
    }

    #[test]
    fn test_set_price() {
        let catalog = sample_catalog();
        assert!(catalog.set_price(ProductId::new(3), Decimal::new(70, 0)));
        assert_eq!(
            catalog.get_by_id(ProductId::new(3)).unwrap().price,
            Decimal::new(70, 0)
        );
        assert!(!catalog.set_price(ProductId::new(42), Decimal::ONE));
    }

    #[test]
    fn test_from_json_file_accepts_numeric_prices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"id": 9, "name": "Fitness Shoe", "price": 70, "category": "fitness", "image": "img/za7.jpg"}]"#,
        )
        .unwrap();

        let catalog = InMemoryCatalog::from_json_file(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get_by_id(ProductId::new(9)).unwrap().price, Decimal::new(70, 0));
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = InMemoryCatalog::from_json_file(Path::new("/nonexistent/catalog.json"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
