//! Shared types for the order service workspace.

mod types;

pub use types::{ItemId, OrderId};
