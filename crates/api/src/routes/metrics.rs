//! Prometheus metrics exposition.

use axum::extract::State;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics — renders the Prometheus exposition format.
pub async fn render(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
