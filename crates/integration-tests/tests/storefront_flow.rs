//! End-to-end tests covering browsing, cart and checkout.

use std::path::Path;
use std::sync::Arc;

use rust_decimal::Decimal;
use zapastyle_core::ProductId;
use zapastyle_integration_tests::{CATALOG_FIXTURE, dyn_catalog};
use zapastyle_storefront::analytics::CartEventKind;
use zapastyle_storefront::cart::CartError;
use zapastyle_storefront::catalog::{Catalog, InMemoryCatalog};
use zapastyle_storefront::config::StorefrontConfig;
use zapastyle_storefront::listing::{ProductQuery, SortOrder};
use zapastyle_storefront::notifications::RecordingNotifier;
use zapastyle_storefront::state::Storefront;
use zapastyle_storefront::storage::MemoryStorage;

fn storefront_with(config: &StorefrontConfig) -> (Storefront, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let storage = MemoryStorage::with_quota(config.storage_quota_bytes).context();
    let mut storefront = Storefront::new(config, dyn_catalog(), Arc::new(storage), notifier.clone());
    storefront.init();
    (storefront, notifier)
}

fn storefront() -> (Storefront, Arc<RecordingNotifier>) {
    storefront_with(&StorefrontConfig::default())
}

// =============================================================================
// Cart Tests
// =============================================================================

#[test]
fn test_add_add_remove() {
    let (mut storefront, _) = storefront();
    let id = ProductId::new(3);

    storefront.cart_mut().add_item(id, 2).unwrap();
    assert_eq!(storefront.cart().total(), Decimal::new(130, 0));
    assert_eq!(storefront.cart().item_count(), 2);

    storefront.cart_mut().add_item(id, 1).unwrap();
    assert_eq!(storefront.cart().quantity_of(id), 3);
    assert_eq!(storefront.cart().total(), Decimal::new(195, 0));

    assert!(storefront.cart_mut().remove_item(id));
    assert!(storefront.cart().items().is_empty());
    assert_eq!(storefront.cart().total(), Decimal::ZERO);
}

#[test]
fn test_unknown_product_leaves_cart_unchanged() {
    let (mut storefront, notifier) = storefront();

    let err = storefront.cart_mut().add_item(ProductId::new(99), 1).unwrap_err();

    assert_eq!(err, CartError::NotFound(ProductId::new(99)));
    assert_eq!(storefront.cart().item_count(), 0);
    assert!(notifier.messages().is_empty());
}

#[test]
fn test_checkout_flow() {
    let (mut storefront, notifier) = storefront();
    storefront.cart_mut().add_item(ProductId::new(2), 1).unwrap();
    storefront.cart_mut().add_item(ProductId::new(4), 3).unwrap();

    let order = storefront.checkout("ZS-2000").unwrap();

    assert_eq!(order.lines.len(), 2);
    assert_eq!(order.total, Decimal::new(300, 0));
    assert_eq!(
        storefront.format_price(order.total).to_string(),
        "S/ 300.00"
    );
    assert_eq!(storefront.cart().item_count(), 0);

    let kinds: Vec<_> = storefront
        .analytics()
        .cart_events()
        .into_iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            CartEventKind::AddToCart,
            CartEventKind::AddToCart,
            CartEventKind::Purchase,
            CartEventKind::Purchase,
        ]
    );
    assert!(
        notifier
            .messages()
            .contains(&"Order ZS-2000 confirmed: S/ 300.00".to_string())
    );
}

#[test]
fn test_quota_failure_keeps_in_memory_cart() {
    let config = StorefrontConfig {
        storage_quota_bytes: 16,
        ..StorefrontConfig::default()
    };
    let (mut storefront, notifier) = storefront_with(&config);

    storefront.cart_mut().add_item(ProductId::new(1), 1).unwrap();

    assert_eq!(storefront.cart().item_count(), 1);
    assert_eq!(notifier.messages(), vec!["Urban Sneaker added to cart"]);
}

// =============================================================================
// Listing Tests
// =============================================================================

#[test]
fn test_listing_filters_and_sorts() {
    let (storefront, _) = storefront();

    let names: Vec<_> = ProductQuery::new()
        .category("sport")
        .sort(SortOrder::PriceAsc)
        .run(storefront.catalog())
        .into_iter()
        .map(|p| p.name)
        .collect();

    assert_eq!(names, vec!["Sport Sneaker", "Running Shoe"]);
}

#[test]
fn test_shipped_catalog_loads() {
    let catalog = InMemoryCatalog::from_json_file(Path::new(CATALOG_FIXTURE)).unwrap();

    assert_eq!(catalog.len(), 10);
    assert_eq!(
        catalog.get_by_id(ProductId::new(3)).unwrap().price,
        Decimal::new(65, 0)
    );
    assert_eq!(
        catalog.categories(),
        vec!["urban", "sport", "casual", "outdoor", "fitness"]
    );
}
