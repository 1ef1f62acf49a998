use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use common::OrderId;
use order_store::OrderView;

use crate::DEFAULT_TTL;

struct Slot {
    view: OrderView,
    stored_at: Instant,
}

/// Cache of one order view per order id with a fixed TTL.
///
/// Misses are never cached: a lookup that finds nothing stores nothing,
/// so a later write is always visible. Expired slots are dropped on the
/// read that observes them.
#[derive(Clone)]
pub struct EntryCache {
    slots: Arc<RwLock<HashMap<OrderId, Slot>>>,
    ttl: Duration,
}

impl EntryCache {
    /// Creates an entry cache with the default 60-second TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Creates an entry cache with an explicit TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Returns the cached view for the id, if present and fresh.
    pub fn get(&self, id: OrderId) -> Option<OrderView> {
        {
            let slots = self.slots.read().unwrap();
            match slots.get(&id) {
                Some(slot) if slot.stored_at.elapsed() < self.ttl => {
                    return Some(slot.view.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // The slot existed and had expired; drop it.
        self.remove_if_expired(id);
        None
    }

    /// Drops the slot only if it is still expired: a concurrent `put`
    /// may have replaced it between the lock acquisitions.
    fn remove_if_expired(&self, id: OrderId) {
        let mut slots = self.slots.write().unwrap();
        if let Some(slot) = slots.get(&id)
            && slot.stored_at.elapsed() >= self.ttl
        {
            slots.remove(&id);
        }
    }

    /// Stores a view, keyed by its order id. Overwrites any prior slot
    /// and restarts the TTL.
    pub fn put(&self, view: OrderView) {
        let mut slots = self.slots.write().unwrap();
        slots.insert(
            view.id,
            Slot {
                view,
                stored_at: Instant::now(),
            },
        );
    }

    /// Removes the slot for the id, if any.
    pub fn evict(&self, id: OrderId) {
        self.slots.write().unwrap().remove(&id);
    }

    /// Returns the number of slots, expired ones included.
    pub fn len(&self) -> usize {
        self.slots.read().unwrap().len()
    }

    /// Returns true when no slots are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EntryCache {
    fn default() -> Self {
        Self::new()
    }
}
