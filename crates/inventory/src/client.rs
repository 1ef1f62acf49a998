//! Inventory client trait and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ItemId;

use crate::error::{InventoryError, Result};

/// A stock record as reported by the inventory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockItem {
    /// The item this record describes.
    pub id: ItemId,
    /// Units currently available.
    pub quantity: u32,
}

/// Contract the order core expects from the remote inventory service.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Fetches the current stock record for an item.
    async fn get_item(&self, id: ItemId) -> Result<StockItem>;

    /// Decrements the available quantity for an item.
    async fn reduce_quantity(&self, id: ItemId, amount: u32) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    stock: HashMap<ItemId, u32>,
    fail_on_get: bool,
    fail_on_reduce: bool,
    fail_on_reduce_for: HashSet<ItemId>,
    get_calls: u32,
    reduce_calls: u32,
}

/// In-memory inventory client for tests and local runs.
///
/// Failure switches simulate a degraded remote service; call counters
/// let tests assert which network operations were attempted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryClient {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryClient {
    /// Creates a new empty in-memory inventory client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the available quantity for an item.
    pub fn set_stock(&self, id: ItemId, quantity: u32) {
        self.state.write().unwrap().stock.insert(id, quantity);
    }

    /// Returns the available quantity for an item, if known.
    pub fn quantity(&self, id: ItemId) -> Option<u32> {
        self.state.read().unwrap().stock.get(&id).copied()
    }

    /// Makes every `get_item` call fail as unavailable.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().unwrap().fail_on_get = fail;
    }

    /// Makes every `reduce_quantity` call fail as unavailable.
    pub fn set_fail_on_reduce(&self, fail: bool) {
        self.state.write().unwrap().fail_on_reduce = fail;
    }

    /// Makes `reduce_quantity` fail as unavailable for one specific item.
    pub fn set_fail_on_reduce_for(&self, id: ItemId) {
        self.state.write().unwrap().fail_on_reduce_for.insert(id);
    }

    /// Number of `get_item` calls attempted, failures included.
    pub fn get_call_count(&self) -> u32 {
        self.state.read().unwrap().get_calls
    }

    /// Number of `reduce_quantity` calls attempted, failures included.
    pub fn reduce_call_count(&self) -> u32 {
        self.state.read().unwrap().reduce_calls
    }
}

#[async_trait]
impl InventoryClient for InMemoryInventoryClient {
    async fn get_item(&self, id: ItemId) -> Result<StockItem> {
        let mut state = self.state.write().unwrap();
        state.get_calls += 1;

        if state.fail_on_get {
            return Err(InventoryError::Unavailable(
                "simulated inventory outage".to_string(),
            ));
        }

        match state.stock.get(&id) {
            Some(&quantity) => Ok(StockItem { id, quantity }),
            None => Err(InventoryError::ItemNotFound(id)),
        }
    }

    async fn reduce_quantity(&self, id: ItemId, amount: u32) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.reduce_calls += 1;

        if state.fail_on_reduce || state.fail_on_reduce_for.contains(&id) {
            return Err(InventoryError::Unavailable(
                "simulated inventory outage".to_string(),
            ));
        }

        match state.stock.get_mut(&id) {
            Some(quantity) if *quantity >= amount => {
                *quantity -= amount;
                Ok(())
            }
            Some(_) => Err(InventoryError::Unavailable(format!(
                "insufficient stock for item {id}"
            ))),
            None => Err(InventoryError::ItemNotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_item_reports_stock() {
        let client = InMemoryInventoryClient::new();
        let item = ItemId::new();
        client.set_stock(item, 7);

        let stock = client.get_item(item).await.unwrap();
        assert_eq!(stock.quantity, 7);
        assert_eq!(client.get_call_count(), 1);
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let client = InMemoryInventoryClient::new();
        let result = client.get_item(ItemId::new()).await;
        assert!(matches!(result, Err(InventoryError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn reduce_decrements_stock() {
        let client = InMemoryInventoryClient::new();
        let item = ItemId::new();
        client.set_stock(item, 3);

        client.reduce_quantity(item, 1).await.unwrap();
        assert_eq!(client.quantity(item), Some(2));
        assert_eq!(client.reduce_call_count(), 1);
    }

    #[tokio::test]
    async fn reduce_below_zero_fails() {
        let client = InMemoryInventoryClient::new();
        let item = ItemId::new();
        client.set_stock(item, 0);

        let result = client.reduce_quantity(item, 1).await;
        assert!(matches!(result, Err(InventoryError::Unavailable(_))));
        assert_eq!(client.quantity(item), Some(0));
    }

    #[tokio::test]
    async fn per_item_failure_switch() {
        let client = InMemoryInventoryClient::new();
        let good = ItemId::new();
        let bad = ItemId::new();
        client.set_stock(good, 5);
        client.set_stock(bad, 5);
        client.set_fail_on_reduce_for(bad);

        client.reduce_quantity(good, 1).await.unwrap();
        let result = client.reduce_quantity(bad, 1).await;

        assert!(matches!(result, Err(InventoryError::Unavailable(_))));
        assert_eq!(client.quantity(good), Some(4));
        assert_eq!(client.quantity(bad), Some(5));
    }
}
