//! Order workflow error taxonomy.

use common::{ItemId, OrderId};
use inventory::InventoryError;
use order_store::StoreError;
use thiserror::Error;

/// Errors reported by the order orchestrator.
///
/// Every variant carries a stable kind and a human-readable message;
/// the HTTP layer maps kinds to status codes.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request was malformed or missing required fields.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An item's available quantity is below one.
    #[error("Item {0} is out of stock")]
    OutOfStock(ItemId),

    /// The inventory service does not know the item.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// The inventory service is unreachable or the circuit is open.
    /// Retryable; partial reservations from the same request are not
    /// reversed.
    #[error("Inventory service unavailable: {0}")]
    InventoryUnavailable(String),

    /// The order does not exist or has been soft-deleted.
    #[error("Order not found or has been deleted: {0}")]
    NotFound(OrderId),

    /// The order store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<InventoryError> for OrderError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ItemNotFound(id) => OrderError::ItemNotFound(id),
            InventoryError::Unavailable(msg) => OrderError::InventoryUnavailable(msg),
        }
    }
}
