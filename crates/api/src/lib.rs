//! HTTP API server for the order lifecycle service.
//!
//! Exposes REST endpoints for order creation, lookup, search, update,
//! and soft delete, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use cache::{EntryCache, QueryCache};
use domain::OrderOrchestrator;
use inventory::{InMemoryInventoryClient, InventoryClient, ResilientInventoryGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderStore, OrderStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + 'static, C: InventoryClient + 'static>(
    state: Arc<AppState<S, C>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S, C>))
        .route("/orders", get(routes::orders::list::<S, C>))
        .route("/orders/{id}", get(routes::orders::get::<S, C>))
        .route("/orders/{id}", put(routes::orders::update::<S, C>))
        .route("/orders/{id}", delete(routes::orders::delete::<S, C>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires an orchestrator from its collaborators using the configured
/// cache TTL and circuit-breaker thresholds.
pub fn create_state<S: OrderStore, C: InventoryClient>(
    store: S,
    client: C,
    config: &Config,
) -> Arc<AppState<S, C>> {
    let gateway = ResilientInventoryGateway::with_config(client, config.breaker_config());
    let orchestrator = OrderOrchestrator::with_caches(
        store,
        gateway,
        EntryCache::with_ttl(config.cache_ttl()),
        QueryCache::with_ttl(config.cache_ttl()),
    );

    Arc::new(AppState { orchestrator })
}

/// Creates application state backed by in-memory collaborators.
///
/// Returns handles to the store and inventory client alongside the
/// state so callers (tests, the demo entry point) can seed stock and
/// inspect persisted records.
pub fn create_default_state(
    config: &Config,
) -> (
    Arc<AppState<InMemoryOrderStore, InMemoryInventoryClient>>,
    InMemoryOrderStore,
    InMemoryInventoryClient,
) {
    let store = InMemoryOrderStore::new();
    let client = InMemoryInventoryClient::new();
    let state = create_state(store.clone(), client.clone(), config);
    (state, store, client)
}
