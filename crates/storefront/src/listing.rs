//! Product list filtering and sorting.

use std::str::FromStr;

use thiserror::Error;

use crate::catalog::{Catalog, Product};

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Alphabetical by name, ignoring case.
    Name,
    PriceAsc,
    PriceDesc,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort order {0:?} (expected name, price-asc or price-desc)")]
pub struct SortOrderError(pub String);

impl FromStr for SortOrder {
    type Err = SortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            other => Err(SortOrderError(other.to_string())),
        }
    }
}

/// Filters applied to a product listing: category, then search, then sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
}

impl ProductQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a category. `"all"` clears the filter.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.category = (category != ALL_CATEGORIES).then_some(category);
        self
    }

    /// Filter by search text. Blank text clears the filter.
    #[must_use]
    pub fn search(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.search = (!query.trim().is_empty()).then_some(query);
        self
    }

    #[must_use]
    pub const fn sort(mut self, order: SortOrder) -> Self {
        self.sort = Some(order);
        self
    }

    /// Apply the query to a product list.
    #[must_use]
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        let mut listed: Vec<Product> = products
            .into_iter()
            .filter(|p| self.category.as_deref().is_none_or(|c| p.is_in_category(c)))
            .filter(|p| self.search.as_deref().is_none_or(|q| p.matches_search(q.trim())))
            .collect();

        match self.sort {
            Some(SortOrder::Name) => {
                listed.sort_by_cached_key(|p| p.name.to_lowercase());
            }
            Some(SortOrder::PriceAsc) => listed.sort_by(|a, b| a.price.cmp(&b.price)),
            Some(SortOrder::PriceDesc) => listed.sort_by(|a, b| b.price.cmp(&a.price)),
            None => {}
        }
        listed
    }

    /// Apply the query to the whole catalog.
    #[must_use]
    pub fn run(&self, catalog: &dyn Catalog) -> Vec<Product> {
        self.apply(catalog.get_all())
    }
}
