//! The order workflow engine.

use cache::{EntryCache, QueryCache, QueryKey};
use common::{ItemId, OrderId};
use inventory::{InventoryClient, ResilientInventoryGateway};
use order_store::{Order, OrderFilter, OrderStore, OrderView, Page, PageRequest};

use crate::error::OrderError;

/// Orchestrates order create/read/update/delete across the store, the
/// inventory gateway, and the two cache namespaces.
///
/// There is no per-order lock: two concurrent updates to the same order
/// may interleave their read-modify-write and the last save wins. Cache
/// writes are not transactional with store writes; staleness is bounded
/// by the entry-cache TTL and by the clear-on-every-mutation rule for
/// the query cache.
pub struct OrderOrchestrator<S, C>
where
    S: OrderStore,
    C: InventoryClient,
{
    store: S,
    gateway: ResilientInventoryGateway<C>,
    entry_cache: EntryCache,
    query_cache: QueryCache,
}

impl<S, C> OrderOrchestrator<S, C>
where
    S: OrderStore,
    C: InventoryClient,
{
    /// Creates an orchestrator with default-TTL caches.
    pub fn new(store: S, gateway: ResilientInventoryGateway<C>) -> Self {
        Self::with_caches(store, gateway, EntryCache::new(), QueryCache::new())
    }

    /// Creates an orchestrator with explicitly configured caches.
    pub fn with_caches(
        store: S,
        gateway: ResilientInventoryGateway<C>,
        entry_cache: EntryCache,
        query_cache: QueryCache,
    ) -> Self {
        Self {
            store,
            gateway,
            entry_cache,
            query_cache,
        }
    }

    /// Returns the entry cache for inspection.
    pub fn entry_cache(&self) -> &EntryCache {
        &self.entry_cache
    }

    /// Returns the query cache for inspection.
    pub fn query_cache(&self) -> &QueryCache {
        &self.query_cache
    }

    /// Returns the inventory gateway for inspection.
    pub fn gateway(&self) -> &ResilientInventoryGateway<C> {
        &self.gateway
    }

    /// Creates an order for the given items.
    ///
    /// Two passes over the input, both in input order: an availability
    /// check that mutates nothing, then one reservation (quantity
    /// reduction) per item. A reservation failure aborts the workflow
    /// before any order record exists; reductions already applied in
    /// the same request are not rolled back, matching the behavior this
    /// service replaces.
    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        item_ids: Vec<ItemId>,
        created_by: &str,
    ) -> Result<OrderView, OrderError> {
        if item_ids.is_empty() {
            return Err(OrderError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }

        for &item_id in &item_ids {
            let stock = self.gateway.check_stock(item_id).await?;
            if stock.quantity < 1 {
                tracing::info!(%item_id, "create rejected, item out of stock");
                return Err(OrderError::OutOfStock(item_id));
            }
        }

        for &item_id in &item_ids {
            if let Err(err) = self.gateway.reduce_stock(item_id, 1).await {
                tracing::error!(%item_id, error = %err, "reservation failed mid-order");
                metrics::counter!("order_reservation_failures_total").increment(1);
                return Err(err.into());
            }
        }

        let order = Order::new(item_ids, created_by);
        let id = self.store.insert(order.clone()).await?;

        let view = OrderView::from(&order);
        self.entry_cache.put(view.clone());
        self.query_cache.clear();

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(%id, items = view.item_ids.len(), "order created");
        Ok(view)
    }

    /// Loads one order view, read-through the entry cache.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: OrderId) -> Result<OrderView, OrderError> {
        if let Some(view) = self.entry_cache.get(id) {
            metrics::counter!("order_cache_hits_total").increment(1);
            return Ok(view);
        }
        metrics::counter!("order_cache_misses_total").increment(1);

        let order = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(id))?;

        let view = OrderView::from(&order);
        self.entry_cache.put(view.clone());
        Ok(view)
    }

    /// Searches orders, read-through the query cache.
    ///
    /// The cache key canonicalizes the filter, so the same search with
    /// reordered item ids hits the same entry. Role gating happens at
    /// the HTTP layer before this runs.
    #[tracing::instrument(skip(self))]
    pub async fn search(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Page<OrderView>, OrderError> {
        let key = QueryKey::new(filter, page);
        if let Some(cached) = self.query_cache.get(&key) {
            metrics::counter!("order_search_cache_hits_total").increment(1);
            return Ok(cached);
        }
        metrics::counter!("order_search_cache_misses_total").increment(1);

        let result = self.store.search(filter, page).await?;
        let views = result.map(|order| OrderView::from(&order));

        self.query_cache.put(key, views.clone());
        Ok(views)
    }

    /// Appends one item to an existing order.
    ///
    /// Availability-checks the new item first (no reservation is made
    /// on update), then loads, mutates, and persists the order,
    /// writes through the entry cache, and clears the query cache.
    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        order_id: OrderId,
        item_id: ItemId,
        updated_by: &str,
    ) -> Result<OrderView, OrderError> {
        let stock = self.gateway.check_stock(item_id).await?;
        if stock.quantity < 1 {
            return Err(OrderError::OutOfStock(item_id));
        }

        let mut order = self
            .store
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        order.append_item(item_id, updated_by);
        self.store.save(&order).await?;

        let view = OrderView::from(&order);
        self.entry_cache.put(view.clone());
        self.query_cache.clear();

        metrics::counter!("orders_updated_total").increment(1);
        tracing::info!(%order_id, %item_id, "order updated");
        Ok(view)
    }

    /// Soft-deletes an order.
    ///
    /// The record is retained with its deletion audit pair stamped; a
    /// second delete of the same id fails with NotFound because the
    /// soft-delete filter hides the record from the load.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, order_id: OrderId, deleted_by: &str) -> Result<(), OrderError> {
        let mut order = self
            .store
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        order.mark_deleted(deleted_by);
        self.store.save(&order).await?;

        self.entry_cache.evict(order_id);
        self.query_cache.clear();

        metrics::counter!("orders_deleted_total").increment(1);
        tracing::info!(%order_id, "order soft-deleted");
        Ok(())
    }
}
