use async_trait::async_trait;
use common::OrderId;

use crate::{Order, OrderFilter, Page, PageRequest, Result};

/// Core trait for order store implementations.
///
/// All implementations must be thread-safe (Send + Sync) and must apply
/// the soft-delete filter on every read path: `find_by_id` and `search`
/// never return a record whose `deleted_at` is set.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order record and returns its id.
    async fn insert(&self, order: Order) -> Result<OrderId>;

    /// Point lookup by id.
    ///
    /// Returns `None` when the order does not exist or has been
    /// soft-deleted.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>>;

    /// Filtered, paginated search over non-deleted orders.
    ///
    /// Results are ordered by creation time, then id, for stable
    /// pagination. The returned page carries the total match count.
    async fn search(&self, filter: &OrderFilter, page: PageRequest) -> Result<Page<Order>>;

    /// Full-record upsert.
    ///
    /// Persists the order as given, including soft-delete markers. Used
    /// for both item appends and soft deletes.
    async fn save(&self, order: &Order) -> Result<()>;
}
