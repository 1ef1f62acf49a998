//! The order aggregate record and its external projection.

use chrono::{DateTime, Utc};
use common::{ItemId, OrderId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order has been created and is active.
    Created,
    /// Order has been soft-deleted; invisible to reads, retained in storage.
    Deleted,
}

impl OrderStatus {
    /// Returns the canonical string form used in storage and over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Deleted => "DELETED",
        }
    }

    /// Parses the canonical string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(OrderStatus::Created),
            "DELETED" => Some(OrderStatus::Deleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The durable order record.
///
/// `item_ids` is append-only: items may be added after creation but
/// never removed. Audit fields follow the lifecycle: `created_*` set
/// exactly once at construction, `updated_*` on every mutating update,
/// `deleted_*` exactly once on soft delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub item_ids: Vec<ItemId>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl Order {
    /// Creates a new order with a fresh id, status `Created`, and the
    /// creation audit pair stamped.
    ///
    /// Callers are expected to have validated that `item_ids` is
    /// non-empty; the orchestrator rejects empty orders before reaching
    /// the store.
    pub fn new(item_ids: Vec<ItemId>, created_by: impl Into<String>) -> Self {
        Self {
            id: OrderId::new(),
            status: OrderStatus::Created,
            item_ids,
            created_at: Utc::now(),
            created_by: created_by.into(),
            updated_at: None,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        }
    }

    /// Appends an item to the end of the item list and stamps the
    /// update audit pair. The status is left unchanged.
    pub fn append_item(&mut self, item_id: ItemId, updated_by: impl Into<String>) {
        self.item_ids.push(item_id);
        self.updated_by = Some(updated_by.into());
        self.updated_at = Some(Utc::now());
    }

    /// Marks the order soft-deleted: status becomes `Deleted` and the
    /// deletion audit pair is stamped. The record stays in storage.
    pub fn mark_deleted(&mut self, deleted_by: impl Into<String>) {
        self.status = OrderStatus::Deleted;
        self.deleted_by = Some(deleted_by.into());
        self.deleted_at = Some(Utc::now());
    }

    /// Returns true once the order has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Externally visible projection of an [`Order`].
///
/// This is what handlers return and what the caches store. The deletion
/// audit pair is intentionally not exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: OrderId,
    pub status: OrderStatus,
    pub item_ids: Vec<ItemId>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            status: order.status,
            item_ids: order.item_ids.clone(),
            created_at: order.created_at,
            created_by: order.created_by.clone(),
            updated_at: order.updated_at,
            updated_by: order.updated_by.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_order_defaults_to_created() {
        let item = ItemId::new();
        let order = Order::new(vec![item], "user-1");

        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.item_ids, vec![item]);
        assert_eq!(order.created_by, "user-1");
        assert!(order.updated_at.is_none());
        assert!(!order.is_deleted());
    }

    #[test]
    fn append_item_preserves_order_and_stamps_audit() {
        let first = ItemId::new();
        let second = ItemId::new();
        let mut order = Order::new(vec![first], "user-1");

        order.append_item(second, "user-2");

        assert_eq!(order.item_ids, vec![first, second]);
        assert_eq!(order.updated_by.as_deref(), Some("user-2"));
        assert!(order.updated_at.is_some());
        assert_eq!(order.status, OrderStatus::Created);
    }

    #[test]
    fn mark_deleted_sets_status_and_audit_pair() {
        let mut order = Order::new(vec![ItemId::new()], "user-1");

        order.mark_deleted("admin");

        assert!(order.is_deleted());
        assert_eq!(order.status, OrderStatus::Deleted);
        assert_eq!(order.deleted_by.as_deref(), Some("admin"));
        assert!(order.deleted_at.is_some());
    }

    #[test]
    fn view_hides_deletion_audit() {
        let mut order = Order::new(vec![ItemId::new()], "user-1");
        order.mark_deleted("admin");

        let view = OrderView::from(&order);
        assert_eq!(view.id, order.id);
        assert_eq!(view.status, OrderStatus::Deleted);
        assert_eq!(view.item_ids, order.item_ids);
    }

    #[test]
    fn status_string_roundtrip() {
        assert_eq!(OrderStatus::parse("CREATED"), Some(OrderStatus::Created));
        assert_eq!(OrderStatus::parse("DELETED"), Some(OrderStatus::Deleted));
        assert_eq!(OrderStatus::parse("SHIPPED"), None);
        assert_eq!(OrderStatus::Created.to_string(), "CREATED");
    }
}
