use common::ItemId;
use thiserror::Error;

/// Errors surfaced by the inventory client and gateway.
///
/// `ItemNotFound` is a definitive answer from the service;
/// `Unavailable` is transient (transport failure, service error, or an
/// open circuit) and is the only variant callers may retry.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The inventory service does not know the item.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// The inventory service could not be reached or failed transiently.
    #[error("Inventory service unavailable: {0}")]
    Unavailable(String),
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
