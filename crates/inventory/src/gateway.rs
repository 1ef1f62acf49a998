//! Breaker-wrapped access to the inventory service.

use common::ItemId;

use crate::breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
use crate::client::{InventoryClient, StockItem};
use crate::error::{InventoryError, Result};

/// Wraps an [`InventoryClient`] with a [`CircuitBreaker`].
///
/// A short-circuited or failed call surfaces as
/// [`InventoryError::Unavailable`] with no side effects; the fallback
/// never reports success. A definitive `ItemNotFound` answer from the
/// service passes through untouched and does not count as a breaker
/// failure, so a flood of lookups for unknown items cannot trip the
/// circuit.
pub struct ResilientInventoryGateway<C: InventoryClient> {
    client: C,
    breaker: CircuitBreaker,
}

impl<C: InventoryClient> ResilientInventoryGateway<C> {
    /// Creates a gateway with default breaker thresholds.
    pub fn new(client: C) -> Self {
        Self::with_config(client, CircuitBreakerConfig::default())
    }

    /// Creates a gateway with explicit breaker thresholds.
    pub fn with_config(client: C, config: CircuitBreakerConfig) -> Self {
        Self {
            client,
            breaker: CircuitBreaker::new(config),
        }
    }

    /// Returns the breaker for state inspection.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Returns the wrapped client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetches the stock record for an item through the breaker.
    #[tracing::instrument(skip(self))]
    pub async fn check_stock(&self, item_id: ItemId) -> Result<StockItem> {
        let outcome = self
            .breaker
            .call(async {
                match self.client.get_item(item_id).await {
                    Ok(stock) => Ok(Ok(stock)),
                    // Definitive answer, not a service failure.
                    Err(InventoryError::ItemNotFound(id)) => {
                        Ok(Err(InventoryError::ItemNotFound(id)))
                    }
                    Err(err) => Err(err),
                }
            })
            .await;

        Self::unwrap_outcome(outcome)
    }

    /// Decrements an item's quantity through the breaker.
    #[tracing::instrument(skip(self))]
    pub async fn reduce_stock(&self, item_id: ItemId, amount: u32) -> Result<()> {
        let outcome = self
            .breaker
            .call(async {
                match self.client.reduce_quantity(item_id, amount).await {
                    Ok(()) => Ok(Ok(())),
                    Err(InventoryError::ItemNotFound(id)) => {
                        Ok(Err(InventoryError::ItemNotFound(id)))
                    }
                    Err(err) => Err(err),
                }
            })
            .await;

        Self::unwrap_outcome(outcome)
    }

    fn unwrap_outcome<T>(
        outcome: std::result::Result<Result<T>, CircuitBreakerError<InventoryError>>,
    ) -> Result<T> {
        match outcome {
            Ok(inner) => inner,
            Err(CircuitBreakerError::CircuitOpen) => {
                tracing::warn!("inventory call short-circuited, circuit open");
                Err(InventoryError::Unavailable(
                    "inventory circuit open".to_string(),
                ))
            }
            Err(CircuitBreakerError::OperationFailed(err)) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::CircuitState;
    use crate::client::InMemoryInventoryClient;
    use std::time::Duration;

    fn gateway_with_threshold(
        failures: u32,
    ) -> (ResilientInventoryGateway<InMemoryInventoryClient>, InMemoryInventoryClient) {
        let client = InMemoryInventoryClient::new();
        let config = CircuitBreakerConfig {
            failure_threshold: failures,
            open_duration: Duration::from_secs(60),
            half_open_max_calls: 1,
            success_threshold: 1,
        };
        let gateway = ResilientInventoryGateway::with_config(client.clone(), config);
        (gateway, client)
    }

    #[tokio::test]
    async fn passes_through_while_closed() {
        let (gateway, client) = gateway_with_threshold(3);
        let item = ItemId::new();
        client.set_stock(item, 5);

        let stock = gateway.check_stock(item).await.unwrap();
        assert_eq!(stock.quantity, 5);

        gateway.reduce_stock(item, 1).await.unwrap();
        assert_eq!(client.quantity(item), Some(4));
    }

    #[tokio::test]
    async fn short_circuits_without_network_call_once_open() {
        let (gateway, client) = gateway_with_threshold(2);
        let item = ItemId::new();
        client.set_fail_on_get(true);

        for _ in 0..2 {
            let result = gateway.check_stock(item).await;
            assert!(matches!(result, Err(InventoryError::Unavailable(_))));
        }
        assert_eq!(gateway.breaker().state(), CircuitState::Open);
        assert_eq!(client.get_call_count(), 2);

        // Service is healthy again, but the open circuit answers first.
        client.set_fail_on_get(false);
        client.set_stock(item, 5);
        let result = gateway.check_stock(item).await;

        assert!(matches!(result, Err(InventoryError::Unavailable(_))));
        assert_eq!(client.get_call_count(), 2);
    }

    #[tokio::test]
    async fn not_found_passes_through_and_does_not_trip_breaker() {
        let (gateway, _client) = gateway_with_threshold(2);

        for _ in 0..5 {
            let result = gateway.check_stock(ItemId::new()).await;
            assert!(matches!(result, Err(InventoryError::ItemNotFound(_))));
        }
        assert_eq!(gateway.breaker().state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn reduce_failures_also_trip_the_breaker() {
        let (gateway, client) = gateway_with_threshold(2);
        let item = ItemId::new();
        client.set_stock(item, 5);
        client.set_fail_on_reduce(true);

        for _ in 0..2 {
            let result = gateway.reduce_stock(item, 1).await;
            assert!(matches!(result, Err(InventoryError::Unavailable(_))));
        }
        assert_eq!(gateway.breaker().state(), CircuitState::Open);

        // Short-circuited reduce leaves stock untouched.
        client.set_fail_on_reduce(false);
        let result = gateway.reduce_stock(item, 1).await;
        assert!(matches!(result, Err(InventoryError::Unavailable(_))));
        assert_eq!(client.quantity(item), Some(5));
        assert_eq!(client.reduce_call_count(), 2);
    }
}
