//! Integration tests for cart changes shared between browsing contexts.
//!
//! Each context gets its own `StorageContext` on one `MemoryStorage` area,
//! like tabs sharing an origin's local storage.

use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use zapastyle_core::ProductId;
use zapastyle_integration_tests::dyn_catalog;
use zapastyle_storefront::cart::CartStore;
use zapastyle_storefront::events::{EventBus, EventKind, StoreEvent};
use zapastyle_storefront::storage::{KeyValueStore, MemoryStorage};

fn tab(area: &MemoryStorage) -> CartStore {
    let storage = area.context();
    let feed = storage.change_feed();
    let mut cart = CartStore::new(dyn_catalog(), Arc::new(storage)).with_change_feed(feed);
    cart.init();
    cart
}

// =============================================================================
// Notification Tests
// =============================================================================

#[test]
fn test_subscriber_sees_other_tab_add() {
    let area = MemoryStorage::new();
    let mut tab_a = tab(&area);
    let mut tab_b = tab(&area);

    let counts = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&counts);
    tab_b.subscribe(move |state| seen.lock().unwrap().push(state.count));

    tab_a.add_item(ProductId::new(1), 1).unwrap();
    assert!(tab_b.sync_from_storage());

    assert_eq!(*counts.lock().unwrap(), vec![0, 1]);
    assert_eq!(tab_b.quantity_of(ProductId::new(1)), 1);
    assert_eq!(tab_b.total(), Decimal::new(120, 0));
}

#[test]
fn test_own_writes_do_not_trigger_sync() {
    let area = MemoryStorage::new();
    let mut tab_a = tab(&area);
    let mut tab_b = tab(&area);

    // Well past the change feed's buffer
    for _ in 0..100 {
        tab_a.add_item(ProductId::new(2), 1).unwrap();
    }

    assert!(!tab_a.sync_from_storage());
    assert_eq!(tab_a.quantity_of(ProductId::new(2)), 100);
    assert!(tab_b.sync_from_storage());
    assert_eq!(tab_b.quantity_of(ProductId::new(2)), 100);
}

#[test]
fn test_unrelated_keys_are_ignored() {
    let area = MemoryStorage::new();
    let mut tab_b = tab(&area);

    area.context().set_item("theme", "\"dark\"").unwrap();

    assert!(!tab_b.sync_from_storage());
}

#[test]
fn test_sync_emits_cart_synced() {
    let area = MemoryStorage::new();
    let mut tab_a = tab(&area);

    let bus = Arc::new(EventBus::new());
    let synced = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&synced);
    bus.on(EventKind::CartSynced, move |event| {
        if let StoreEvent::CartSynced { cart_count } = event {
            *slot.lock().unwrap() = Some(*cart_count);
        }
        Ok(())
    });
    let storage = area.context();
    let feed = storage.change_feed();
    let mut tab_b = CartStore::new(dyn_catalog(), Arc::new(storage))
        .with_change_feed(feed)
        .with_event_bus(bus);
    tab_b.init();

    tab_a.add_item(ProductId::new(4), 3).unwrap();
    tab_b.sync_from_storage();

    assert_eq!(*synced.lock().unwrap(), Some(3));
}

// =============================================================================
// Conflict Tests
// =============================================================================

#[test]
fn test_last_writer_wins() {
    let area = MemoryStorage::new();
    let mut tab_a = tab(&area);
    let mut tab_b = tab(&area);

    tab_a.add_item(ProductId::new(1), 1).unwrap();
    tab_b.add_item(ProductId::new(2), 1).unwrap();

    // Tab B wrote last, so Tab A adopts Tab B's cart wholesale
    assert!(tab_a.sync_from_storage());
    assert_eq!(tab_a.quantity_of(ProductId::new(1)), 0);
    assert_eq!(tab_a.quantity_of(ProductId::new(2)), 1);
}

#[test]
fn test_clear_in_other_tab_empties_cart() {
    let area = MemoryStorage::new();
    let mut tab_a = tab(&area);
    let mut tab_b = tab(&area);

    tab_a.add_item(ProductId::new(5), 2).unwrap();
    tab_b.sync_from_storage();
    assert_eq!(tab_b.item_count(), 2);

    tab_a.clear();
    assert!(tab_b.sync_from_storage());
    assert!(tab_b.items().is_empty());
    assert_eq!(tab_b.total(), Decimal::ZERO);
}

#[test]
fn test_lagging_tab_resyncs() {
    let area = MemoryStorage::new();
    let mut tab_a = tab(&area);
    let mut tab_b = tab(&area);

    // Far more writes than the change channel buffers
    for _ in 0..200 {
        tab_a.add_item(ProductId::new(3), 1).unwrap();
    }

    assert!(tab_b.sync_from_storage());
    assert_eq!(tab_b.quantity_of(ProductId::new(3)), 200);
}
