use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use common::ItemId;
use order_store::{OrderFilter, OrderStatus, OrderView, Page, PageRequest};

use crate::DEFAULT_TTL;

/// Canonical composite key for one cached page of search results.
///
/// The item-id filter is sorted ascending on construction so that
/// semantically identical queries share a cache entry regardless of the
/// ordering the client supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    status: Option<OrderStatus>,
    item_ids: Vec<ItemId>,
    page: usize,
    size: usize,
}

impl QueryKey {
    /// Builds the canonical key for a filter and page request.
    pub fn new(filter: &OrderFilter, page: PageRequest) -> Self {
        let mut item_ids = filter.item_ids.clone().unwrap_or_default();
        item_ids.sort();

        Self {
            status: filter.status,
            item_ids,
            page: page.page,
            size: page.size,
        }
    }
}

struct Slot {
    page: Page<OrderView>,
    stored_at: Instant,
}

/// Cache of search-result pages keyed by [`QueryKey`].
///
/// Invalidation is coarse on purpose: any mutation anywhere in the
/// system clears the whole namespace via [`QueryCache::clear`],
/// trading hit rate for a simple coherence contract.
#[derive(Clone)]
pub struct QueryCache {
    slots: Arc<RwLock<HashMap<QueryKey, Slot>>>,
    ttl: Duration,
}

impl QueryCache {
    /// Creates a query cache with the default 60-second TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Creates a query cache with an explicit TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Returns the cached page for the key, if present and fresh.
    pub fn get(&self, key: &QueryKey) -> Option<Page<OrderView>> {
        {
            let slots = self.slots.read().unwrap();
            match slots.get(key) {
                Some(slot) if slot.stored_at.elapsed() < self.ttl => {
                    return Some(slot.page.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        self.remove_if_expired(key);
        None
    }

    /// Drops the slot only if it is still expired: a concurrent `put`
    /// may have replaced it between the lock acquisitions.
    fn remove_if_expired(&self, key: &QueryKey) {
        let mut slots = self.slots.write().unwrap();
        if let Some(slot) = slots.get(key)
            && slot.stored_at.elapsed() >= self.ttl
        {
            slots.remove(key);
        }
    }

    /// Stores a page under the key.
    pub fn put(&self, key: QueryKey, page: Page<OrderView>) {
        let mut slots = self.slots.write().unwrap();
        slots.insert(
            key,
            Slot {
                page,
                stored_at: Instant::now(),
            },
        );
    }

    /// Clears every cached page, all keys and all filters.
    pub fn clear(&self) {
        let mut slots = self.slots.write().unwrap();
        if !slots.is_empty() {
            tracing::debug!(cleared = slots.len(), "query cache invalidated");
        }
        slots.clear();
    }

    /// Returns the number of cached pages, expired ones included.
    pub fn len(&self) -> usize {
        self.slots.read().unwrap().len()
    }

    /// Returns true when no pages are cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_store::Order;

    fn sample_page() -> Page<OrderView> {
        let order = Order::new(vec![ItemId::new()], "user-1");
        Page::new(vec![OrderView::from(&order)], PageRequest::default(), 1)
    }

    #[test]
    fn key_canonicalizes_item_id_ordering() {
        let a = ItemId::new();
        let b = ItemId::new();

        let forward = OrderFilter::new().with_item_ids(vec![a, b]);
        let reverse = OrderFilter::new().with_item_ids(vec![b, a]);
        let page = PageRequest::default();

        assert_eq!(QueryKey::new(&forward, page), QueryKey::new(&reverse, page));
    }

    #[test]
    fn key_distinguishes_pagination_and_status() {
        let filter = OrderFilter::new();

        assert_ne!(
            QueryKey::new(&filter, PageRequest::new(0, 10)),
            QueryKey::new(&filter, PageRequest::new(1, 10))
        );
        assert_ne!(
            QueryKey::new(&filter, PageRequest::new(0, 10)),
            QueryKey::new(&filter, PageRequest::new(0, 20))
        );
        assert_ne!(
            QueryKey::new(&filter.clone().with_status(OrderStatus::Created), PageRequest::default()),
            QueryKey::new(&filter, PageRequest::default())
        );
    }

    #[test]
    fn get_put_roundtrip() {
        let cache = QueryCache::new();
        let key = QueryKey::new(&OrderFilter::new(), PageRequest::default());
        let page = sample_page();

        assert!(cache.get(&key).is_none());
        cache.put(key.clone(), page.clone());
        assert_eq!(cache.get(&key), Some(page));
    }

    #[test]
    fn clear_drops_every_key() {
        let cache = QueryCache::new();
        let first = QueryKey::new(&OrderFilter::new(), PageRequest::new(0, 10));
        let second = QueryKey::new(&OrderFilter::new(), PageRequest::new(1, 10));

        cache.put(first.clone(), sample_page());
        cache.put(second.clone(), sample_page());
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&first).is_none());
        assert!(cache.get(&second).is_none());
    }

    #[test]
    fn lazy_eviction_spares_a_freshly_replaced_page() {
        let cache = QueryCache::with_ttl(Duration::from_millis(10));
        let key = QueryKey::new(&OrderFilter::new(), PageRequest::default());
        let page = sample_page();

        cache.put(key.clone(), page.clone());
        std::thread::sleep(Duration::from_millis(20));

        // A writer replaces the expired slot before the eviction runs.
        cache.put(key.clone(), page.clone());
        cache.remove_if_expired(&key);

        assert_eq!(cache.get(&key), Some(page));
    }

    #[test]
    fn expired_page_is_dropped_on_read() {
        let cache = QueryCache::with_ttl(Duration::from_millis(10));
        let key = QueryKey::new(&OrderFilter::new(), PageRequest::default());

        cache.put(key.clone(), sample_page());
        std::thread::sleep(Duration::from_millis(20));

        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }
}
