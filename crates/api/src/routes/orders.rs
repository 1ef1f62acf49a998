//! Order CRUD endpoints.
//!
//! Identity arrives pre-authenticated in the `X-User-Id` and `X-Role`
//! headers; this layer only validates their presence and gates the
//! search endpoint to managers before invoking the orchestrator.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use common::{ItemId, OrderId};
use domain::OrderOrchestrator;
use inventory::InventoryClient;
use order_store::{OrderFilter, OrderStatus, OrderStore, OrderView, Page, PageRequest};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Role allowed to run order searches.
const MANAGER_ROLE: &str = "MANAGER";

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore, C: InventoryClient> {
    pub orchestrator: OrderOrchestrator<S, C>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub item_ids: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateOrderRequest {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub status: Option<String>,
    /// Comma-separated item ids.
    pub item_ids: Option<String>,
    pub page: Option<usize>,
    pub size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub deleted_by: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub item_ids: Vec<String>,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: Option<String>,
    pub updated_by: Option<String>,
}

impl From<OrderView> for OrderResponse {
    fn from(view: OrderView) -> Self {
        Self {
            id: view.id.to_string(),
            status: view.status.to_string(),
            item_ids: view.item_ids.iter().map(ToString::to_string).collect(),
            created_at: view.created_at.to_rfc3339(),
            created_by: view.created_by,
            updated_at: view.updated_at.map(|t| t.to_rfc3339()),
            updated_by: view.updated_by,
        }
    }
}

#[derive(Serialize)]
pub struct PageResponse {
    pub items: Vec<OrderResponse>,
    pub page: usize,
    pub size: usize,
    pub total: usize,
}

impl From<Page<OrderView>> for PageResponse {
    fn from(page: Page<OrderView>) -> Self {
        Self {
            items: page.items.into_iter().map(OrderResponse::from).collect(),
            page: page.page,
            size: page.size,
            total: page.total,
        }
    }
}

// -- Handlers --

/// POST /orders — create an order from a list of item ids.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: OrderStore + 'static, C: InventoryClient + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let user_id = require_header(&headers, "X-User-Id")?;
    require_header(&headers, "X-Role")?;

    let item_ids = parse_item_ids(&req.item_ids)?;
    let view = state.orchestrator.create(item_ids, &user_id).await?;

    Ok((StatusCode::CREATED, Json(view.into())))
}

/// GET /orders — filtered, paginated search. Managers only.
#[tracing::instrument(skip(state, headers))]
pub async fn list<S: OrderStore + 'static, C: InventoryClient + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<PageResponse>, ApiError> {
    require_header(&headers, "X-User-Id")?;
    let role = require_header(&headers, "X-Role")?;
    if role != MANAGER_ROLE {
        return Err(ApiError::Forbidden(
            "Access denied. User role is not MANAGER.".to_string(),
        ));
    }

    let mut filter = OrderFilter::new();
    if let Some(ref status) = params.status {
        let status = OrderStatus::parse(status)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid status '{status}'")))?;
        filter = filter.with_status(status);
    }
    if let Some(ref raw) = params.item_ids {
        let ids: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        filter = filter.with_item_ids(parse_item_ids(&ids)?);
    }

    let page = PageRequest::new(
        params.page.unwrap_or(0),
        params.size.unwrap_or(PageRequest::DEFAULT_SIZE),
    );
    let result = state.orchestrator.search(&filter, page).await?;

    Ok(Json(result.into()))
}

/// GET /orders/{id} — load one order view.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + 'static, C: InventoryClient + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let view = state.orchestrator.get_by_id(order_id).await?;
    Ok(Json(view.into()))
}

/// PUT /orders/{id} — append one item to an order.
#[tracing::instrument(skip(state, headers, req))]
pub async fn update<S: OrderStore + 'static, C: InventoryClient + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let user_id = require_header(&headers, "X-User-Id")?;
    require_header(&headers, "X-Role")?;

    let order_id = parse_order_id(&id)?;
    let item_id = parse_item_id(&req.product_id)?;

    let view = state.orchestrator.update(order_id, item_id, &user_id).await?;
    Ok(Json(view.into()))
}

/// DELETE /orders/{id} — soft-delete an order.
#[tracing::instrument(skip(state))]
pub async fn delete<S: OrderStore + 'static, C: InventoryClient + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, ApiError> {
    let order_id = parse_order_id(&id)?;
    state
        .orchestrator
        .delete(order_id, &params.deleted_by)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Helpers --

fn require_header(headers: &HeaderMap, name: &str) -> Result<String, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| ApiError::BadRequest(format!("Missing required header {name}")))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

fn parse_item_id(id: &str) -> Result<ItemId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid item id: {e}")))?;
    Ok(ItemId::from_uuid(uuid))
}

fn parse_item_ids(ids: &[String]) -> Result<Vec<ItemId>, ApiError> {
    ids.iter().map(|id| parse_item_id(id)).collect()
}
