//! Favorite products, persisted as a list of IDs.

use std::sync::Arc;

use zapastyle_core::ProductId;

use crate::catalog::{Catalog, Product, ProductNotFound};
use crate::events::{EventBus, StoreEvent};
use crate::storage::{KeyValueStore, StorageExt};

/// Storage key for the favorites list.
pub const FAVORITES_KEY: &str = "favorites";

/// Result of toggling membership in a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

pub struct Favorites {
    catalog: Arc<dyn Catalog>,
    storage: Arc<dyn KeyValueStore>,
    events: Option<Arc<EventBus>>,
    ids: Vec<ProductId>,
}

impl Favorites {
    /// Load the persisted favorites. Absent or corrupt data loads as empty.
    #[must_use]
    pub fn load(catalog: Arc<dyn Catalog>, storage: Arc<dyn KeyValueStore>) -> Self {
        let ids = storage.load_json_or(FAVORITES_KEY, Vec::new());
        Self {
            catalog,
            storage,
            events: None,
            ids,
        }
    }

    #[must_use]
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Add the product if absent, remove it if present.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` for unknown products; nothing changes.
    pub fn toggle(&mut self, product_id: ProductId) -> Result<Toggle, ProductNotFound> {
        let product = self.catalog.require(product_id)?;

        let toggle = if let Some(pos) = self.ids.iter().position(|&id| id == product_id) {
            self.ids.remove(pos);
            Toggle::Removed
        } else {
            self.ids.push(product_id);
            Toggle::Added
        };
        tracing::debug!(%product_id, ?toggle, "Favorite toggled");

        if let Err(e) = self.storage.save_json(FAVORITES_KEY, &self.ids) {
            tracing::warn!(error = %e, "Failed to persist favorites");
        }
        if let Some(bus) = &self.events {
            bus.emit(&StoreEvent::FavoriteToggled { product, toggle });
        }
        Ok(toggle)
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.ids.contains(&product_id)
    }

    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    /// Favorite products in the order they were added, skipping any that
    /// are no longer in the catalog.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.ids
            .iter()
            .filter_map(|&id| self.catalog.get_by_id(id))
            .collect()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.ids.len()
    }
}
