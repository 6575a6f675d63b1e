//! User-visible toast notifications.
//!
//! [`Notifier`] is fire-and-forget: nothing in the storefront consumes a
//! result from it. [`ToastRelay`] turns bus events into toasts, so services
//! never show notifications themselves.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use zapastyle_core::{CurrencyCode, Price};

use crate::compare::{CompareOutcome, MAX_COMPARE_ITEMS};
use crate::events::{EventBus, EventKind, ListenerId, StoreEvent};
use crate::favorites::Toggle;
use crate::theme::Theme;

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastLevel {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastLevel {
    /// How long a toast of this level stays visible by default.
    #[must_use]
    pub const fn default_duration(&self) -> Duration {
        match self {
            Self::Success | Self::Info => Duration::from_millis(3000),
            Self::Error => Duration::from_millis(5000),
            Self::Warning => Duration::from_millis(4000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub duration: Duration,
}

impl Toast {
    /// Toast with the level's default duration.
    #[must_use]
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            duration: level.default_duration(),
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Displays toasts to the user.
///
/// The level helpers take an optional duration; `None` keeps the level's
/// default.
pub trait Notifier: Send + Sync {
    fn show(&self, toast: Toast);

    fn show_success(&self, message: &str, duration: Option<Duration>) {
        self.show(leveled(ToastLevel::Success, message, duration));
    }

    fn show_error(&self, message: &str, duration: Option<Duration>) {
        self.show(leveled(ToastLevel::Error, message, duration));
    }

    fn show_warning(&self, message: &str, duration: Option<Duration>) {
        self.show(leveled(ToastLevel::Warning, message, duration));
    }
}

fn leveled(level: ToastLevel, message: &str, duration: Option<Duration>) -> Toast {
    let toast = Toast::new(level, message);
    match duration {
        Some(duration) => toast.with_duration(duration),
        None => toast,
    }
}

/// Writes toasts to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, toast: Toast) {
        let duration_ms = toast.duration.as_millis();
        match toast.level {
            ToastLevel::Error => tracing::error!(duration_ms, "{}", toast.message),
            ToastLevel::Warning => tracing::warn!(duration_ms, "{}", toast.message),
            ToastLevel::Success | ToastLevel::Info => {
                tracing::info!(duration_ms, "{}", toast.message);
            }
        }
    }
}

/// Keeps every toast shown, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.toasts().into_iter().map(|t| t.message).collect()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, toast: Toast) {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner).push(toast);
    }
}

/// Shows a toast for each user-facing store event.
pub struct ToastRelay;

impl ToastRelay {
    /// Register the relay's listeners on `bus`.
    pub fn attach(
        bus: &EventBus,
        notifier: Arc<dyn Notifier>,
        currency: CurrencyCode,
    ) -> Vec<(EventKind, ListenerId)> {
        [
            EventKind::ItemAdded,
            EventKind::ItemRemoved,
            EventKind::CartCleared,
            EventKind::FavoriteToggled,
            EventKind::CompareToggled,
            EventKind::ThemeChanged,
            EventKind::PurchaseCompleted,
        ]
        .into_iter()
        .map(|kind| {
            let notifier = Arc::clone(&notifier);
            let id = bus.on(kind, move |event| {
                if let Some(toast) = toast_for(event, currency) {
                    notifier.show(toast);
                }
                Ok(())
            });
            (kind, id)
        })
        .collect()
    }
}

fn toast_for(event: &StoreEvent, currency: CurrencyCode) -> Option<Toast> {
    let (level, message) = match event {
        StoreEvent::ItemAdded { product, .. } => {
            (ToastLevel::Success, format!("{} added to cart", product.name))
        }
        StoreEvent::ItemRemoved { .. } => {
            (ToastLevel::Success, "Product removed from cart".to_string())
        }
        StoreEvent::CartCleared => (ToastLevel::Success, "Cart emptied".to_string()),
        StoreEvent::FavoriteToggled { product, toggle } => match toggle {
            Toggle::Added => (
                ToastLevel::Success,
                format!("{} added to favorites", product.name),
            ),
            Toggle::Removed => (
                ToastLevel::Success,
                format!("{} removed from favorites", product.name),
            ),
        },
        StoreEvent::CompareToggled { product, outcome } => match outcome {
            CompareOutcome::Added => (
                ToastLevel::Success,
                format!("{} added to comparison", product.name),
            ),
            CompareOutcome::Removed => (
                ToastLevel::Success,
                format!("{} removed from comparison", product.name),
            ),
            CompareOutcome::Full => (
                ToastLevel::Warning,
                format!("You can compare at most {MAX_COMPARE_ITEMS} products"),
            ),
        },
        StoreEvent::ThemeChanged { theme } => {
            let name = match theme {
                Theme::Light => "Light",
                Theme::Dark => "Dark",
            };
            (ToastLevel::Success, format!("{name} theme enabled"))
        }
        StoreEvent::PurchaseCompleted { order } => (
            ToastLevel::Success,
            format!(
                "Order {} confirmed: {}",
                order.order_number,
                Price::new(order.total, currency)
            ),
        ),
        StoreEvent::QuantityUpdated { .. }
        | StoreEvent::CartSynced { .. }
        | StoreEvent::AppInitialized { .. } => return None,
    };
    Some(Toast::new(level, message))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use zapastyle_core::ProductId;

    use super::*;
    use crate::cart::OrderSummary;
    use crate::catalog::tests::product;

    #[test]
    fn test_default_durations() {
        assert_eq!(Toast::new(ToastLevel::Success, "ok").duration.as_millis(), 3000);
        assert_eq!(Toast::new(ToastLevel::Error, "no").duration.as_millis(), 5000);
        assert_eq!(Toast::new(ToastLevel::Warning, "hm").duration.as_millis(), 4000);
        assert_eq!(
            Toast::new(ToastLevel::Info, "x")
                .with_duration(Duration::from_millis(10))
                .duration,
            Duration::from_millis(10)
        );
    }

    #[test]
    fn test_helpers_use_levels() {
        let notifier = RecordingNotifier::new();
        notifier.show_success("saved", None);
        notifier.show_warning("careful", None);
        notifier.show_error("failed", Some(Duration::from_millis(1500)));

        let toasts = notifier.take();
        let levels: Vec<_> = toasts.iter().map(|t| t.level).collect();
        assert_eq!(
            levels,
            vec![ToastLevel::Success, ToastLevel::Warning, ToastLevel::Error]
        );
        let durations: Vec<_> = toasts.iter().map(|t| t.duration.as_millis()).collect();
        assert_eq!(durations, vec![3000, 4000, 1500]);
        assert!(notifier.toasts().is_empty());
    }

    #[test]
    fn test_relay_shows_cart_toasts() {
        let bus = EventBus::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let listeners = ToastRelay::attach(&bus, notifier.clone(), CurrencyCode::PEN);
        assert_eq!(listeners.len(), 7);

        bus.emit(&StoreEvent::ItemAdded {
            product: product(3, "Sport Sneaker", 65, "sport"),
            quantity: 1,
            cart_count: 1,
        });
        bus.emit(&StoreEvent::QuantityUpdated {
            product_id: ProductId::new(3),
            quantity: 2,
            cart_count: 2,
        });
        bus.emit(&StoreEvent::CartCleared);

        assert_eq!(
            notifier.messages(),
            vec!["Sport Sneaker added to cart", "Cart emptied"]
        );
    }

    #[test]
    fn test_relay_warns_when_comparison_is_full() {
        let bus = EventBus::new();
        let notifier = Arc::new(RecordingNotifier::new());
        ToastRelay::attach(&bus, notifier.clone(), CurrencyCode::PEN);

        bus.emit(&StoreEvent::CompareToggled {
            product: product(1, "Urban Sneaker", 120, "urban"),
            outcome: CompareOutcome::Full,
        });

        let toasts = notifier.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, ToastLevel::Warning);
        assert_eq!(toasts[0].message, "You can compare at most 3 products");
    }

    #[test]
    fn test_relay_formats_order_total() {
        let bus = EventBus::new();
        let notifier = Arc::new(RecordingNotifier::new());
        ToastRelay::attach(&bus, notifier.clone(), CurrencyCode::PEN);

        bus.emit(&StoreEvent::PurchaseCompleted {
            order: OrderSummary {
                order_number: "ZS-7".to_string(),
                lines: Vec::new(),
                total: Decimal::new(195, 0),
            },
        });

        assert_eq!(notifier.messages(), vec!["Order ZS-7 confirmed: S/ 195.00"]);
    }
}
