use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::common::{
    created_response, no_content_response, success_response, validate_input, ActingUser,
    PaginatedResponse,
};
use crate::{
    errors::ApiError,
    services::purchase_orders::{PurchaseOrderInput, PurchaseOrderListQuery},
    ApiResponse, AppState,
};

/// Body of `PATCH /purchase-order-items/:id/status-partial`
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReceiptRequest {
    pub status_partial: bool,
    #[validate(range(min = 0, message = "received_qty must not be negative"))]
    pub received_qty: Option<i32>,
}

pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(query): Query<PurchaseOrderListQuery>,
) -> Result<Response, ApiError> {
    let page = state.services.purchase_orders.list(query).await?;
    Ok(success_response(PaginatedResponse::new(
        page.orders,
        page.page,
        page.per_page,
        page.total,
    )))
}

pub async fn create_purchase_order(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Json(payload): Json<PurchaseOrderInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let order = state.services.purchase_orders.create(payload, actor).await?;
    info!(order_id = %order.order.id, "Purchase order created via API");
    Ok(created_response(ApiResponse::success(order)))
}

pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let order = state.services.purchase_orders.get(id).await?;
    Ok(success_response(ApiResponse::success(order)))
}

pub async fn update_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PurchaseOrderInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let order = state.services.purchase_orders.update(id, payload).await?;
    Ok(success_response(ApiResponse::success(order)))
}

pub async fn delete_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.services.purchase_orders.delete(id).await?;
    Ok(no_content_response())
}

pub async fn approve_purchase_order(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let order = state.services.purchase_orders.approve(id, actor).await?;
    Ok(success_response(
        ApiResponse::success(order).with_message("Purchase order approved"),
    ))
}

pub async fn reject_purchase_order(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let order = state.services.purchase_orders.reject(id, actor).await?;
    Ok(success_response(
        ApiResponse::success(order).with_message("Purchase order rejected"),
    ))
}

/// Marks one purchase order item as (partially) received
pub async fn update_purchase_item_status_partial(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateReceiptRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let result = state
        .services
        .purchase_receipts
        .reconcile_item_delivery(item_id, payload.status_partial, payload.received_qty, actor)
        .await?;
    Ok(success_response(ApiResponse::success(result)))
}

pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_purchase_orders).post(create_purchase_order))
        .route(
            "/:id",
            get(get_purchase_order)
                .put(update_purchase_order)
                .delete(delete_purchase_order),
        )
        .route("/:id/approve", post(approve_purchase_order))
        .route("/:id/reject", post(reject_purchase_order))
}

pub fn purchase_order_item_routes() -> Router<AppState> {
    Router::new().route("/:id/status-partial", patch(update_purchase_item_status_partial))
}
