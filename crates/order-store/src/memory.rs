use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::{Order, OrderFilter, OrderStore, Page, PageRequest, Result};

/// In-memory order store for tests and local runs.
///
/// Provides the same interface as the PostgreSQL implementation,
/// including the mandatory soft-delete filter on reads.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records, soft-deleted included.
    pub async fn record_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns true when a record exists for the id, soft-deleted or not.
    ///
    /// Bypasses the soft-delete filter; useful for asserting that
    /// deletion retains the record.
    pub async fn contains_record(&self, id: OrderId) -> bool {
        self.orders.read().await.contains_key(&id)
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<OrderId> {
        let id = order.id;
        self.orders.write().await.insert(id, order);
        Ok(id)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).filter(|o| !o.is_deleted()).cloned())
    }

    async fn search(&self, filter: &OrderFilter, page: PageRequest) -> Result<Page<Order>> {
        let orders = self.orders.read().await;

        let mut matches: Vec<Order> = orders
            .values()
            .filter(|o| !o.is_deleted() && filter.matches(o))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.id.as_uuid().cmp(&b.id.as_uuid()))
        });

        let total = matches.len();
        let items: Vec<Order> = matches
            .into_iter()
            .skip(page.offset())
            .take(page.size)
            .collect();

        Ok(Page::new(items, page, total))
    }

    async fn save(&self, order: &Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ItemId;
    use crate::OrderStatus;

    #[tokio::test]
    async fn insert_and_find() {
        let store = InMemoryOrderStore::new();
        let order = Order::new(vec![ItemId::new()], "user-1");

        let id = store.insert(order.clone()).await.unwrap();
        assert_eq!(id, order.id);

        let found = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found, order);
    }

    #[tokio::test]
    async fn find_missing_returns_none() {
        let store = InMemoryOrderStore::new();
        let found = store.find_by_id(OrderId::new()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn soft_deleted_record_is_invisible_but_retained() {
        let store = InMemoryOrderStore::new();
        let mut order = Order::new(vec![ItemId::new()], "user-1");
        let id = store.insert(order.clone()).await.unwrap();

        order.mark_deleted("admin");
        store.save(&order).await.unwrap();

        assert!(store.find_by_id(id).await.unwrap().is_none());
        assert!(store.contains_record(id).await);
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn search_excludes_soft_deleted() {
        let store = InMemoryOrderStore::new();
        let keep = Order::new(vec![ItemId::new()], "user-1");
        let mut drop = Order::new(vec![ItemId::new()], "user-1");
        store.insert(keep.clone()).await.unwrap();
        store.insert(drop.clone()).await.unwrap();

        drop.mark_deleted("admin");
        store.save(&drop).await.unwrap();

        let page = store
            .search(&OrderFilter::new(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, keep.id);
    }

    #[tokio::test]
    async fn search_filters_by_status_and_items() {
        let store = InMemoryOrderStore::new();
        let widget = ItemId::new();
        let gadget = ItemId::new();

        let with_widget = Order::new(vec![widget], "user-1");
        let with_gadget = Order::new(vec![gadget], "user-2");
        store.insert(with_widget.clone()).await.unwrap();
        store.insert(with_gadget.clone()).await.unwrap();

        let filter = OrderFilter::new().with_item_ids(vec![widget]);
        let page = store.search(&filter, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, with_widget.id);

        let filter = OrderFilter::new().with_status(OrderStatus::Deleted);
        let page = store.search(&filter, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn search_paginates_with_stable_ordering() {
        let store = InMemoryOrderStore::new();
        for _ in 0..5 {
            store
                .insert(Order::new(vec![ItemId::new()], "user-1"))
                .await
                .unwrap();
        }

        let first = store
            .search(&OrderFilter::new(), PageRequest::new(0, 2))
            .await
            .unwrap();
        let second = store
            .search(&OrderFilter::new(), PageRequest::new(1, 2))
            .await
            .unwrap();
        let third = store
            .search(&OrderFilter::new(), PageRequest::new(2, 2))
            .await
            .unwrap();

        assert_eq!(first.total, 5);
        assert_eq!(first.items.len(), 2);
        assert_eq!(second.items.len(), 2);
        assert_eq!(third.items.len(), 1);

        // No id appears on two pages.
        let mut seen: Vec<OrderId> = Vec::new();
        for page in [&first, &second, &third] {
            for order in &page.items {
                assert!(!seen.contains(&order.id));
                seen.push(order.id);
            }
        }
    }

    #[tokio::test]
    async fn save_upserts_full_record() {
        let store = InMemoryOrderStore::new();
        let mut order = Order::new(vec![ItemId::new()], "user-1");
        store.insert(order.clone()).await.unwrap();

        let extra = ItemId::new();
        order.append_item(extra, "user-2");
        store.save(&order).await.unwrap();

        let found = store.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(found.item_ids.len(), 2);
        assert_eq!(found.updated_by.as_deref(), Some("user-2"));
    }
}
