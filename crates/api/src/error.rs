//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Role check failed.
    Forbidden(String),
    /// Order workflow error.
    Order(OrderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Order(err) => order_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, String) {
    match &err {
        OrderError::Validation(_)
        | OrderError::OutOfStock(_)
        | OrderError::ItemNotFound(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        OrderError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        OrderError::InventoryUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        OrderError::Store(inner) => {
            tracing::error!(error = %inner, "order store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}
