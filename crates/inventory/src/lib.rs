//! Remote inventory collaboration for the order service.
//!
//! [`InventoryClient`] is the contract the order core expects from the
//! remote inventory service. [`ResilientInventoryGateway`] wraps a
//! client with an explicit [`CircuitBreaker`] state machine so a
//! degraded inventory service degrades into fast, side-effect-free
//! `Unavailable` answers instead of piled-up timeouts.

mod breaker;
mod client;
mod error;
mod gateway;

pub use breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
pub use client::{InMemoryInventoryClient, InventoryClient, StockItem};
pub use error::{InventoryError, Result};
pub use gateway::ResilientInventoryGateway;
