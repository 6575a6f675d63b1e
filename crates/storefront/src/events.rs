//! Synchronous in-process event bus.
//!
//! Services publish [`StoreEvent`]s after each state change. Listeners run on
//! the emitting thread, in registration order. A listener that fails is
//! logged and skipped; the remaining listeners still receive the event.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use zapastyle_core::ProductId;

use crate::cart::OrderSummary;
use crate::catalog::Product;
use crate::compare::CompareOutcome;
use crate::favorites::Toggle;
use crate::theme::Theme;

/// Error type listeners may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

type Handler = Arc<dyn Fn(&StoreEvent) -> Result<(), HandlerError> + Send + Sync>;

/// Everything the storefront announces on the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ItemAdded {
        product: Product,
        quantity: u32,
        cart_count: u64,
    },
    ItemRemoved {
        product_id: ProductId,
        cart_count: u64,
    },
    QuantityUpdated {
        product_id: ProductId,
        quantity: u32,
        cart_count: u64,
    },
    CartCleared,
    /// The cart was replaced by a change made in another browsing context.
    CartSynced {
        cart_count: u64,
    },
    FavoriteToggled {
        product: Product,
        toggle: Toggle,
    },
    CompareToggled {
        product: Product,
        outcome: CompareOutcome,
    },
    ThemeChanged {
        theme: Theme,
    },
    PurchaseCompleted {
        order: OrderSummary,
    },
    AppInitialized {
        version: &'static str,
    },
}

impl StoreEvent {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ItemAdded { .. } => EventKind::ItemAdded,
            Self::ItemRemoved { .. } => EventKind::ItemRemoved,
            Self::QuantityUpdated { .. } => EventKind::QuantityUpdated,
            Self::CartCleared => EventKind::CartCleared,
            Self::CartSynced { .. } => EventKind::CartSynced,
            Self::FavoriteToggled { .. } => EventKind::FavoriteToggled,
            Self::CompareToggled { .. } => EventKind::CompareToggled,
            Self::ThemeChanged { .. } => EventKind::ThemeChanged,
            Self::PurchaseCompleted { .. } => EventKind::PurchaseCompleted,
            Self::AppInitialized { .. } => EventKind::AppInitialized,
        }
    }
}

/// Event discriminant used to register listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemAdded,
    ItemRemoved,
    QuantityUpdated,
    CartCleared,
    CartSynced,
    FavoriteToggled,
    CompareToggled,
    ThemeChanged,
    PurchaseCompleted,
    AppInitialized,
}

impl EventKind {
    /// Stable wire name, e.g. `cart:item_added`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ItemAdded => "cart:item_added",
            Self::ItemRemoved => "cart:item_removed",
            Self::QuantityUpdated => "cart:quantity_updated",
            Self::CartCleared => "cart:cleared",
            Self::CartSynced => "cart:synced",
            Self::FavoriteToggled => "favorites:toggled",
            Self::CompareToggled => "compare:toggled",
            Self::ThemeChanged => "theme:changed",
            Self::PurchaseCompleted => "purchase:completed",
            Self::AppInitialized => "app:initialized",
        }
    }
}

/// Handle returned by [`EventBus::on`], used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Same-thread publish/subscribe fan-out.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<EventKind, Vec<(ListenerId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: Fn(&StoreEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered for `kind`.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let Some(handlers) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(listener, _)| *listener != id);
        handlers.len() < before
    }

    /// Deliver `event` to every listener registered for its kind.
    pub fn emit(&self, event: &StoreEvent) {
        let kind = event.kind();
        // Snapshot so listeners may call `on`/`off` while being notified
        let handlers: Vec<Handler> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        tracing::trace!(event = kind.name(), listeners = handlers.len(), "Emitting event");

        for handler in handlers {
            if let Err(e) = handler(event) {
                tracing::error!(event = kind.name(), error = %e, "Event listener failed");
            }
        }
    }

    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }
}
