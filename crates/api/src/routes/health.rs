//! Liveness probe.

use axum::Json;
use serde_json::{Value, json};

/// GET /health — reports the service as alive.
pub async fn check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "order-api" }))
}
