//! Storefront assembly.
//!
//! [`Storefront`] wires every service to one catalog, one storage backend
//! and one event bus, attaches the toast relay and analytics listeners, and
//! owns the services for the lifetime of a browsing context.

use std::sync::Arc;

use rust_decimal::Decimal;
use zapastyle_core::{CurrencyCode, Price};

use crate::analytics::AnalyticsTracker;
use crate::cart::{CartError, CartStore, OrderSummary};
use crate::catalog::Catalog;
use crate::compare::CompareList;
use crate::config::StorefrontConfig;
use crate::events::{EventBus, StoreEvent};
use crate::favorites::Favorites;
use crate::notifications::{Notifier, ToastRelay};
use crate::storage::{ChangeFeed, KeyValueStore};
use crate::theme::ThemeSettings;

/// Application version announced on initialization.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// All storefront services for one browsing context.
pub struct Storefront {
    catalog: Arc<dyn Catalog>,
    events: Arc<EventBus>,
    cart: CartStore,
    favorites: Favorites,
    compare: CompareList,
    analytics: Arc<AnalyticsTracker>,
    theme: ThemeSettings,
    currency: CurrencyCode,
    initialized: bool,
}

impl Storefront {
    /// Build the services. Nothing is loaded into the cart until
    /// [`Storefront::init`] runs.
    #[must_use]
    pub fn new(
        config: &StorefrontConfig,
        catalog: Arc<dyn Catalog>,
        storage: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let events = Arc::new(EventBus::new());
        ToastRelay::attach(&events, notifier, config.currency);

        let analytics = Arc::new(AnalyticsTracker::load(
            Arc::clone(&catalog),
            Arc::clone(&storage),
        ));
        analytics.attach(&events);

        let cart = CartStore::new(Arc::clone(&catalog), Arc::clone(&storage))
            .with_key(config.cart_key.clone())
            .with_event_bus(Arc::clone(&events));
        let favorites = Favorites::load(Arc::clone(&catalog), Arc::clone(&storage))
            .with_event_bus(Arc::clone(&events));
        let compare = CompareList::new(Arc::clone(&catalog)).with_event_bus(Arc::clone(&events));
        let theme = ThemeSettings::load(storage).with_event_bus(Arc::clone(&events));

        Self {
            catalog,
            events,
            cart,
            favorites,
            compare,
            analytics,
            theme,
            currency: config.currency,
            initialized: false,
        }
    }

    /// Follow cart changes made by other browsing contexts.
    ///
    /// Must be called before [`Storefront::init`] to observe every change.
    #[must_use]
    pub fn with_change_feed(mut self, feed: ChangeFeed) -> Self {
        self.cart.attach_change_feed(feed);
        self
    }

    /// Load persisted state and announce readiness. Subsequent calls do nothing.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.cart.init();
        self.initialized = true;
        self.events.emit(&StoreEvent::AppInitialized { version: VERSION });
        tracing::info!(version = VERSION, items = self.cart.item_count(), "Storefront initialized");
    }

    /// Record that the user opened `page`.
    pub fn visit(&self, page: &str) {
        self.analytics.track_page_view(page);
        tracing::debug!(page, "Page visited");
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Apply changes made by other browsing contexts.
    pub fn sync(&mut self) -> bool {
        self.cart.sync_from_storage()
    }

    /// Check out the cart: announces the purchase, then empties the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Empty` if the cart has no items.
    pub fn checkout(&mut self, order_number: &str) -> Result<OrderSummary, CartError> {
        self.cart.checkout(order_number)
    }

    /// Format an amount in the configured currency.
    #[must_use]
    pub const fn format_price(&self, amount: Decimal) -> Price {
        Price::new(amount, self.currency)
    }

    #[must_use]
    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    #[must_use]
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    #[must_use]
    pub const fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn favorites_mut(&mut self) -> &mut Favorites {
        &mut self.favorites
    }

    #[must_use]
    pub const fn compare(&self) -> &CompareList {
        &self.compare
    }

    pub fn compare_mut(&mut self) -> &mut CompareList {
        &mut self.compare
    }

    #[must_use]
    pub fn analytics(&self) -> &AnalyticsTracker {
        &self.analytics
    }

    #[must_use]
    pub const fn theme(&self) -> &ThemeSettings {
        &self.theme
    }

    pub fn theme_mut(&mut self) -> &mut ThemeSettings {
        &mut self.theme
    }
}
