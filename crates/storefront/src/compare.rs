//! Side-by-side product comparison.
//!
//! The comparison list lives only for the current page; it is not persisted.

use std::sync::Arc;

use zapastyle_core::ProductId;

use crate::catalog::{Catalog, Product, ProductNotFound};
use crate::events::{EventBus, StoreEvent};

/// Maximum number of products compared at once.
pub const MAX_COMPARE_ITEMS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOutcome {
    Added,
    Removed,
    /// The list already holds [`MAX_COMPARE_ITEMS`] products; nothing changed.
    Full,
}

pub struct CompareList {
    catalog: Arc<dyn Catalog>,
    events: Option<Arc<EventBus>>,
    ids: Vec<ProductId>,
}

impl CompareList {
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            events: None,
            ids: Vec::with_capacity(MAX_COMPARE_ITEMS),
        }
    }

    #[must_use]
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Add the product if absent and there is room, remove it if present.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` for unknown products.
    pub fn toggle(&mut self, product_id: ProductId) -> Result<CompareOutcome, ProductNotFound> {
        let product = self.catalog.require(product_id)?;

        let outcome = if let Some(pos) = self.ids.iter().position(|&id| id == product_id) {
            self.ids.remove(pos);
            CompareOutcome::Removed
        } else if self.ids.len() >= MAX_COMPARE_ITEMS {
            CompareOutcome::Full
        } else {
            self.ids.push(product_id);
            CompareOutcome::Added
        };

        if let Some(bus) = &self.events {
            bus.emit(&StoreEvent::CompareToggled { product, outcome });
        }
        Ok(outcome)
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.ids.contains(&product_id)
    }

    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.ids
            .iter()
            .filter_map(|&id| self.catalog.get_by_id(id))
            .collect()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
