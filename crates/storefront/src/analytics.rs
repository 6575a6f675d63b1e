//! Page, product and cart analytics counters.
//!
//! Counters are kept in storage under [`PAGE_VIEWS_KEY`],
//! [`PRODUCT_VIEWS_KEY`] and [`CART_EVENTS_KEY`]. Only the most recent
//! [`MAX_CART_EVENTS`] cart events are retained.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zapastyle_core::ProductId;

use crate::catalog::{Catalog, Product};
use crate::events::{EventBus, EventKind, ListenerId, StoreEvent};
use crate::storage::{KeyValueStore, StorageExt};

pub const PAGE_VIEWS_KEY: &str = "pageViews";
pub const PRODUCT_VIEWS_KEY: &str = "productViews";
pub const CART_EVENTS_KEY: &str = "cartEvents";

pub const MAX_CART_EVENTS: usize = 100;
pub const DEFAULT_POPULAR_LIMIT: usize = 5;

/// Page recorded when the path has no final segment.
const INDEX_PAGE: &str = "index.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartEventKind {
    AddToCart,
    Purchase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEvent {
    #[serde(rename = "type")]
    pub kind: CartEventKind,
    pub product_id: ProductId,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopularProduct {
    pub product: Product,
    pub views: u64,
}

/// Totals across every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalyticsStats {
    pub total_page_views: u64,
    pub total_product_views: u64,
    pub cart_events: usize,
}

#[derive(Default)]
struct Counters {
    page_views: BTreeMap<String, u64>,
    product_views: BTreeMap<ProductId, u64>,
    cart_events: Vec<CartEvent>,
}

pub struct AnalyticsTracker {
    catalog: Arc<dyn Catalog>,
    storage: Arc<dyn KeyValueStore>,
    counters: Mutex<Counters>,
}

impl AnalyticsTracker {
    /// Load persisted counters; anything missing or corrupt starts empty.
    #[must_use]
    pub fn load(catalog: Arc<dyn Catalog>, storage: Arc<dyn KeyValueStore>) -> Self {
        let counters = Counters {
            page_views: storage.load_json_or(PAGE_VIEWS_KEY, BTreeMap::new()),
            product_views: storage.load_json_or(PRODUCT_VIEWS_KEY, BTreeMap::new()),
            cart_events: storage.load_json_or(CART_EVENTS_KEY, Vec::new()),
        };
        Self {
            catalog,
            storage,
            counters: Mutex::new(counters),
        }
    }

    /// Record cart activity published on `bus`.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) -> Vec<(EventKind, ListenerId)> {
        let tracker = Arc::clone(self);
        let added = bus.on(EventKind::ItemAdded, move |event| {
            if let StoreEvent::ItemAdded { product, quantity, .. } = event {
                let mut data = Map::new();
                data.insert("quantity".to_string(), Value::from(*quantity));
                tracker.track_cart_event(CartEventKind::AddToCart, product.id, data);
            }
            Ok(())
        });

        let tracker = Arc::clone(self);
        let purchased = bus.on(EventKind::PurchaseCompleted, move |event| {
            if let StoreEvent::PurchaseCompleted { order } = event {
                for line in &order.lines {
                    let mut data = Map::new();
                    data.insert("quantity".to_string(), Value::from(line.quantity));
                    data.insert("price".to_string(), Value::String(line.unit_price.to_string()));
                    data.insert(
                        "orderNumber".to_string(),
                        Value::String(order.order_number.clone()),
                    );
                    tracker.track_cart_event(CartEventKind::Purchase, line.product_id, data);
                }
            }
            Ok(())
        });

        vec![
            (EventKind::ItemAdded, added),
            (EventKind::PurchaseCompleted, purchased),
        ]
    }

    /// Count a visit to `path`, keyed by its final segment.
    pub fn track_page_view(&self, path: &str) {
        let page = path
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(INDEX_PAGE)
            .to_string();

        let mut counters = self.lock();
        *counters.page_views.entry(page).or_insert(0) += 1;
        self.persist(PAGE_VIEWS_KEY, &counters.page_views);
    }

    pub fn track_product_view(&self, product_id: ProductId) {
        let mut counters = self.lock();
        *counters.product_views.entry(product_id).or_insert(0) += 1;
        self.persist(PRODUCT_VIEWS_KEY, &counters.product_views);
    }

    pub fn track_cart_event(
        &self,
        kind: CartEventKind,
        product_id: ProductId,
        data: Map<String, Value>,
    ) {
        let mut counters = self.lock();
        counters.cart_events.push(CartEvent {
            kind,
            product_id,
            timestamp: Utc::now(),
            data,
        });
        let excess = counters.cart_events.len().saturating_sub(MAX_CART_EVENTS);
        counters.cart_events.drain(..excess);
        self.persist(CART_EVENTS_KEY, &counters.cart_events);
    }

    #[must_use]
    pub fn page_views(&self) -> BTreeMap<String, u64> {
        self.lock().page_views.clone()
    }

    #[must_use]
    pub fn product_views(&self, product_id: ProductId) -> u64 {
        self.lock().product_views.get(&product_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn cart_events(&self) -> Vec<CartEvent> {
        self.lock().cart_events.clone()
    }

    #[must_use]
    pub fn stats(&self) -> AnalyticsStats {
        let counters = self.lock();
        AnalyticsStats {
            total_page_views: counters.page_views.values().sum(),
            total_product_views: counters.product_views.values().sum(),
            cart_events: counters.cart_events.len(),
        }
    }

    /// Most viewed products, highest first. Ties keep ascending ID order;
    /// products no longer in the catalog are skipped.
    #[must_use]
    pub fn popular_products(&self, limit: usize) -> Vec<PopularProduct> {
        let mut views: Vec<(ProductId, u64)> = self
            .lock()
            .product_views
            .iter()
            .map(|(&id, &count)| (id, count))
            .collect();
        views.sort_by(|a, b| b.1.cmp(&a.1));

        views
            .into_iter()
            .take(limit)
            .filter_map(|(id, views)| {
                self.catalog
                    .get_by_id(id)
                    .map(|product| PopularProduct { product, views })
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.storage.save_json(key, value) {
            tracing::warn!(key, error = %e, "Failed to persist analytics");
        }
    }
}
