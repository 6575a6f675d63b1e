//! Shared in-memory storage area with cross-context change notifications.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use uuid::Uuid;

use super::{KeyValueStore, StorageError};

/// Default quota for a storage area, matching common browser limits.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Buffered change events per subscriber before it is considered lagging.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Identifies one browsing context (tab, page) attached to a storage area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Change notification published when a context modifies the storage area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Changed key, or `None` when the whole area was cleared.
    pub key: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// Context that performed the write.
    pub origin: ContextId,
}

#[derive(Default)]
struct AreaData {
    entries: BTreeMap<String, String>,
    used_bytes: usize,
}

/// Sending half of one context's change feed.
struct FeedSender {
    context: ContextId,
    sender: broadcast::Sender<StorageEvent>,
}

struct StorageArea {
    data: Mutex<AreaData>,
    quota: usize,
    feeds: Mutex<Vec<FeedSender>>,
}

impl StorageArea {
    /// Deliver `event` to every feed except the writer's own.
    fn publish(&self, event: &StorageEvent) {
        let mut feeds = self.feeds.lock().unwrap_or_else(PoisonError::into_inner);
        feeds.retain(|feed| feed.sender.receiver_count() > 0);
        for feed in feeds.iter().filter(|feed| feed.context != event.origin) {
            // The receiver may be dropped between retain and send.
            let _ = feed.sender.send(event.clone());
        }
    }
}

/// An origin-wide storage area shared by every context created from it.
///
/// Cloning is cheap and yields a handle to the same area.
#[derive(Clone)]
pub struct MemoryStorage {
    area: Arc<StorageArea>,
}

impl MemoryStorage {
    /// Create an empty area with the default quota.
    #[must_use]
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    /// Create an empty area limited to `quota` bytes of keys plus values.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            area: Arc::new(StorageArea {
                data: Mutex::new(AreaData::default()),
                quota,
                feeds: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Attach a new browsing context to this area.
    #[must_use]
    pub fn context(&self) -> StorageContext {
        StorageContext {
            id: ContextId::generate(),
            area: Arc::clone(&self.area),
        }
    }

    /// Bytes currently used by keys and values.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.area
            .data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .used_bytes
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// One browsing context's view of a [`MemoryStorage`] area.
pub struct StorageContext {
    id: ContextId,
    area: Arc<StorageArea>,
}

impl StorageContext {
    #[must_use]
    pub const fn id(&self) -> ContextId {
        self.id
    }

    /// Subscribe to writes made by *other* contexts of the same area.
    ///
    /// Only changes made after this call are observed. The context's own
    /// writes never reach the feed, so they cannot make it lag.
    #[must_use]
    pub fn change_feed(&self) -> ChangeFeed {
        let (sender, receiver) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        self.area
            .feeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FeedSender {
                context: self.id,
                sender,
            });
        ChangeFeed {
            context: self.id,
            receiver,
        }
    }
}

fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

impl KeyValueStore for StorageContext {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let data = self.area.data.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(data.entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let event = {
            let mut data = self.area.data.lock().unwrap_or_else(PoisonError::into_inner);
            let previous = data.entries.get(key).cloned();
            if previous.as_deref() == Some(value) {
                return Ok(());
            }

            let released = previous.as_deref().map_or(0, |old| entry_size(key, old));
            let required = data.used_bytes - released + entry_size(key, value);
            if required > self.area.quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    quota: self.area.quota,
                });
            }

            data.entries.insert(key.to_string(), value.to_string());
            data.used_bytes = required;

            StorageEvent {
                key: Some(key.to_string()),
                old_value: previous,
                new_value: Some(value.to_string()),
                origin: self.id,
            }
        };

        self.area.publish(&event);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let event = {
            let mut data = self.area.data.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(previous) = data.entries.remove(key) else {
                return Ok(());
            };
            data.used_bytes -= entry_size(key, &previous);

            StorageEvent {
                key: Some(key.to_string()),
                old_value: Some(previous),
                new_value: None,
                origin: self.id,
            }
        };

        self.area.publish(&event);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        {
            let mut data = self.area.data.lock().unwrap_or_else(PoisonError::into_inner);
            if data.entries.is_empty() {
                return Ok(());
            }
            data.entries.clear();
            data.used_bytes = 0;
        }

        self.area.publish(&StorageEvent {
            key: None,
            old_value: None,
            new_value: None,
            origin: self.id,
        });
        Ok(())
    }
}

/// Item yielded by a [`ChangeFeed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    /// Another context changed the area.
    Changed(StorageEvent),
    /// Events were dropped because the consumer fell behind; reload everything.
    Resync,
}

/// Receives storage changes made by other contexts.
pub struct ChangeFeed {
    context: ContextId,
    receiver: broadcast::Receiver<StorageEvent>,
}

impl ChangeFeed {
    /// Next pending change from another context, without blocking.
    pub fn try_next(&mut self) -> Option<FeedItem> {
        match self.receiver.try_recv() {
            Ok(event) => Some(FeedItem::Changed(event)),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(context = %self.context, skipped, "Storage change feed lagged");
                Some(FeedItem::Resync)
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_share_entries() {
        let storage = MemoryStorage::new();
        let tab_a = storage.context();
        let tab_b = storage.context();

        tab_a.set_item("cart", "[]").unwrap();
        assert_eq!(tab_b.get_item("cart").unwrap().as_deref(), Some("[]"));
        assert_ne!(tab_a.id(), tab_b.id());
    }

    #[test]
    fn test_feed_skips_own_writes() {
        let storage = MemoryStorage::new();
        let tab_a = storage.context();
        let tab_b = storage.context();
        let mut feed_a = tab_a.change_feed();
        let mut feed_b = tab_b.change_feed();

        tab_a.set_item("cart", "[1]").unwrap();

        assert_eq!(feed_a.try_next(), None);
        let Some(FeedItem::Changed(event)) = feed_b.try_next() else {
            panic!("expected a change event");
        };
        assert_eq!(event.key.as_deref(), Some("cart"));
        assert_eq!(event.old_value, None);
        assert_eq!(event.new_value.as_deref(), Some("[1]"));
        assert_eq!(event.origin, tab_a.id());
        assert_eq!(feed_b.try_next(), None);
    }

    #[test]
    fn test_unchanged_value_is_not_broadcast() {
        let storage = MemoryStorage::new();
        let tab_a = storage.context();
        let tab_b = storage.context();
        tab_a.set_item("theme", "\"dark\"").unwrap();

        let mut feed_b = tab_b.change_feed();
        tab_a.set_item("theme", "\"dark\"").unwrap();
        assert_eq!(feed_b.try_next(), None);
    }

    #[test]
    fn test_remove_and_clear_events() {
        let storage = MemoryStorage::new();
        let tab_a = storage.context();
        let tab_b = storage.context();
        tab_a.set_item("a", "1").unwrap();
        tab_a.set_item("b", "2").unwrap();
        let mut feed_b = tab_b.change_feed();

        tab_a.remove_item("a").unwrap();
        tab_a.remove_item("missing").unwrap();
        tab_a.clear().unwrap();

        let Some(FeedItem::Changed(removed)) = feed_b.try_next() else {
            panic!("expected removal");
        };
        assert_eq!(removed.key.as_deref(), Some("a"));
        assert_eq!(removed.new_value, None);

        let Some(FeedItem::Changed(cleared)) = feed_b.try_next() else {
            panic!("expected clear");
        };
        assert_eq!(cleared.key, None);
        assert_eq!(feed_b.try_next(), None);
        assert_eq!(storage.used_bytes(), 0);
    }

    #[test]
    fn test_quota_rejects_and_keeps_previous_value() {
        let storage = MemoryStorage::with_quota(10);
        let tab = storage.context();

        tab.set_item("k", "small").unwrap();
        assert_eq!(storage.used_bytes(), 6);

        let err = tab.set_item("k", "much too large").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { required: 15, quota: 10, .. }));
        assert_eq!(tab.get_item("k").unwrap().as_deref(), Some("small"));

        // Replacing releases the old entry's bytes first
        tab.set_item("k", "123456789").unwrap();
        assert_eq!(storage.used_bytes(), 10);
    }

    #[test]
    fn test_own_writes_never_fill_the_feed() {
        let storage = MemoryStorage::new();
        let tab_a = storage.context();
        let tab_b = storage.context();
        let mut feed_a = tab_a.change_feed();

        for i in 0..CHANGE_CHANNEL_CAPACITY * 2 {
            tab_a.set_item("counter", &i.to_string()).unwrap();
        }
        assert_eq!(feed_a.try_next(), None);

        tab_b.set_item("theme", "\"dark\"").unwrap();
        let Some(FeedItem::Changed(event)) = feed_a.try_next() else {
            panic!("expected a change event");
        };
        assert_eq!(event.origin, tab_b.id());
    }

    #[test]
    fn test_dropped_feeds_are_released() {
        let storage = MemoryStorage::new();
        let tab_a = storage.context();
        let tab_b = storage.context();
        drop(tab_b.change_feed());

        tab_a.set_item("k", "v").unwrap();

        assert!(storage.area.feeds.lock().unwrap().is_empty());
    }

    #[test]
    fn test_lagging_feed_requests_resync() {
        let storage = MemoryStorage::new();
        let tab_a = storage.context();
        let tab_b = storage.context();
        let mut feed_b = tab_b.change_feed();

        for i in 0..=CHANGE_CHANNEL_CAPACITY {
            tab_a.set_item("counter", &i.to_string()).unwrap();
        }

        assert_eq!(feed_b.try_next(), Some(FeedItem::Resync));
    }
}
