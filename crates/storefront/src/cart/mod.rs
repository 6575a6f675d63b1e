//! Shopping cart state.
//!
//! [`CartStore`] is the single source of truth for the cart within one
//! browsing context. It persists the raw line items after every mutation,
//! recomputes derived totals from live catalog prices, and notifies its
//! subscribers with the full [`CartState`].
//!
//! # Replication
//!
//! Every context holds its own replica. When another context writes the cart
//! key, [`CartStore::sync_from_storage`] replaces the local item list
//! wholesale with the persisted value (last writer wins; no merge).
//!
//! # Failure semantics
//!
//! Unknown products are rejected before any state change. Storage failures
//! are logged and absorbed: the in-memory state stays authoritative and the
//! mutation still notifies, but the change may not survive a reload.

mod types;

pub use types::{CartLineItem, CartState, OrderLine, OrderSummary};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;
use zapastyle_core::ProductId;

use crate::catalog::{Catalog, ProductNotFound};
use crate::events::{EventBus, StoreEvent};
use crate::storage::{ChangeFeed, FeedItem, KeyValueStore, StorageExt};

/// Storage key used when none is configured.
pub const DEFAULT_CART_KEY: &str = "zapaStyle_cart";

/// Errors returned by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product does not exist in the catalog.
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// Quantities must be positive.
    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// Merging the quantity would overflow.
    #[error("quantity overflow for product {0}")]
    QuantityOverflow(ProductId),

    /// Checkout requires at least one line item.
    #[error("cart is empty")]
    Empty,
}

impl From<ProductNotFound> for CartError {
    fn from(err: ProductNotFound) -> Self {
        Self::NotFound(err.0)
    }
}

/// Handle returned by [`CartStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&CartState) + Send>;

/// The cart of one browsing context.
pub struct CartStore {
    key: String,
    catalog: Arc<dyn Catalog>,
    storage: Arc<dyn KeyValueStore>,
    feed: Option<ChangeFeed>,
    events: Option<Arc<EventBus>>,
    items: Vec<CartLineItem>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    initialized: bool,
}

impl CartStore {
    /// Create an empty, uninitialized cart. Call [`CartStore::init`] to load
    /// the persisted items.
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            key: DEFAULT_CART_KEY.to_string(),
            catalog,
            storage,
            feed: None,
            events: None,
            items: Vec::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
            initialized: false,
        }
    }

    /// Persist under `key` instead of [`DEFAULT_CART_KEY`].
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Follow writes made by other contexts.
    #[must_use]
    pub fn with_change_feed(mut self, feed: ChangeFeed) -> Self {
        self.attach_change_feed(feed);
        self
    }

    /// Follow writes made by other contexts, replacing any previous feed.
    pub fn attach_change_feed(&mut self, feed: ChangeFeed) {
        self.feed = Some(feed);
    }

    /// Publish mutations on `bus`.
    #[must_use]
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load persisted items and notify subscribers.
    ///
    /// Absent or corrupt data loads as an empty cart. Calling this again
    /// after a successful init leaves the in-memory state untouched.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn init(&mut self) {
        if self.initialized {
            tracing::debug!("Cart already initialized");
            return;
        }
        self.items = self.load_items();
        self.initialized = true;
        tracing::debug!(items = self.items.len(), "Cart initialized");
        self.notify();
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` for unknown products and
    /// `CartError::InvalidQuantity` / `CartError::QuantityOverflow` for bad
    /// quantities. Nothing is changed or persisted on error.
    #[instrument(skip(self))]
    pub fn add_item(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        let product = self.catalog.require(product_id)?;
        if quantity == 0 {
            return Err(CartError::InvalidQuantity {
                product_id,
                quantity,
            });
        }

        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartError::QuantityOverflow(product_id))?;
            }
            None => self.items.push(CartLineItem {
                product_id,
                quantity,
                product: product.clone(),
                added_at: Utc::now(),
            }),
        }

        self.persist();
        self.notify();
        self.emit(&StoreEvent::ItemAdded {
            product,
            quantity,
            cart_count: self.item_count(),
        });
        Ok(())
    }

    /// Remove a product's line. Returns `false` (and does nothing) if absent.
    #[instrument(skip(self))]
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return false;
        }

        self.persist();
        self.notify();
        self.emit(&StoreEvent::ItemRemoved {
            product_id,
            cart_count: self.item_count(),
        });
        true
    }

    /// Set a line's quantity exactly; 0 removes the line.
    ///
    /// Returns `false` if the product is not in the cart.
    #[instrument(skip(self))]
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) else {
            return false;
        };
        item.quantity = quantity;

        self.persist();
        self.notify();
        self.emit(&StoreEvent::QuantityUpdated {
            product_id,
            quantity,
            cart_count: self.item_count(),
        });
        true
    }

    /// Empty the cart unconditionally.
    #[instrument(skip(self))]
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
        self.notify();
        self.emit(&StoreEvent::CartCleared);
    }

    /// Capture the cart as an order, announce it and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Empty` if there is nothing to check out.
    #[instrument(skip(self))]
    pub fn checkout(&mut self, order_number: &str) -> Result<OrderSummary, CartError> {
        if self.items.is_empty() {
            return Err(CartError::Empty);
        }

        let lines = self
            .items
            .iter()
            .filter_map(|item| {
                let product = self.catalog.get_by_id(item.product_id)?;
                Some(OrderLine {
                    product_id: item.product_id,
                    name: product.name,
                    quantity: item.quantity,
                    unit_price: product.price,
                })
            })
            .collect();
        let order = OrderSummary {
            order_number: order_number.to_string(),
            lines,
            total: self.total(),
        };

        tracing::info!(order_number, total = %order.total, "Checkout completed");
        self.emit(&StoreEvent::PurchaseCompleted {
            order: order.clone(),
        });
        self.clear();
        Ok(order)
    }

    /// Copy of the current line items.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.items.clone()
    }

    /// Quantity of one product, or 0 if it is not in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.items
            .iter()
            .find(|i| i.product_id == product_id)
            .map_or(0, |i| i.quantity)
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of quantity times the *current* catalog price.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| match self.catalog.get_by_id(item.product_id) {
                Some(product) => product.price * Decimal::from(item.quantity),
                None => {
                    tracing::warn!(product_id = %item.product_id, "Cart item no longer in catalog");
                    Decimal::ZERO
                }
            })
            .sum()
    }

    #[must_use]
    pub fn state(&self) -> CartState {
        CartState {
            items: self.items(),
            count: self.item_count(),
            total: self.total(),
        }
    }

    /// Register a listener. It is called immediately with the current state,
    /// then after every change.
    pub fn subscribe<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut(&CartState) + Send + 'static,
    {
        callback(&self.state());
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() < before
    }

    /// Apply changes other contexts made to the cart key.
    ///
    /// Drains the change feed; if any pending change touches the cart (or
    /// the whole area was cleared, or events were missed) the local items
    /// are replaced by the persisted value and subscribers are notified.
    /// Returns whether the cart was reloaded.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn sync_from_storage(&mut self) -> bool {
        let mut stale = false;
        while let Some(item) = self.feed.as_mut().and_then(ChangeFeed::try_next) {
            stale |= match item {
                FeedItem::Changed(event) => event.key.as_deref().is_none_or(|k| k == self.key),
                FeedItem::Resync => true,
            };
        }
        if !stale {
            return false;
        }

        self.items = self.load_items();
        tracing::debug!(items = self.items.len(), "Cart replaced from storage");
        self.notify();
        self.emit(&StoreEvent::CartSynced {
            cart_count: self.item_count(),
        });
        true
    }

    fn load_items(&self) -> Vec<CartLineItem> {
        let stored: Vec<CartLineItem> = self.storage.load_json_or(&self.key, Vec::new());

        // One line per product, positive quantities, and no orphans
        let mut items: Vec<CartLineItem> = Vec::with_capacity(stored.len());
        let mut index: HashMap<ProductId, usize> = HashMap::new();
        for item in stored {
            if item.quantity == 0 {
                tracing::warn!(product_id = %item.product_id, "Dropping stored cart line with zero quantity");
                continue;
            }
            if self.catalog.get_by_id(item.product_id).is_none() {
                tracing::warn!(product_id = %item.product_id, "Dropping stored cart line for unknown product");
                continue;
            }
            match index.get(&item.product_id).and_then(|&i| items.get_mut(i)) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => {
                    index.insert(item.product_id, items.len());
                    items.push(item);
                }
            }
        }
        items
    }

    fn persist(&self) {
        if let Err(e) = self.storage.save_json(&self.key, &self.items) {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist cart");
        }
    }

    fn notify(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let state = self.state();
        for (_, callback) in &mut self.subscribers {
            callback(&state);
        }
    }

    fn emit(&self, event: &StoreEvent) {
        if let Some(bus) = &self.events {
            bus.emit(event);
        }
    }
}
