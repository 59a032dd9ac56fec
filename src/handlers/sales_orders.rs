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
    services::sales_orders::{SalesOrderInput, SalesOrderListQuery},
    ApiResponse, AppState,
};

/// Body of `PATCH /sales-order-items/:id/status-partial`
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDeliveryRequest {
    pub status_partial: bool,
    #[validate(range(min = 0, message = "delivered_qty must not be negative"))]
    pub delivered_qty: Option<i32>,
}

pub async fn list_sales_orders(
    State(state): State<AppState>,
    Query(query): Query<SalesOrderListQuery>,
) -> Result<Response, ApiError> {
    let page = state.services.sales_orders.list(query).await?;
    Ok(success_response(PaginatedResponse::new(
        page.orders,
        page.page,
        page.per_page,
        page.total,
    )))
}

pub async fn create_sales_order(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Json(payload): Json<SalesOrderInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let order = state.services.sales_orders.create(payload, actor).await?;
    info!(order_id = %order.order.id, "Sales order created via API");
    Ok(created_response(ApiResponse::success(order)))
}

pub async fn get_sales_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let order = state.services.sales_orders.get(id).await?;
    Ok(success_response(ApiResponse::success(order)))
}

pub async fn update_sales_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SalesOrderInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let order = state.services.sales_orders.update(id, payload).await?;
    Ok(success_response(ApiResponse::success(order)))
}

pub async fn delete_sales_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.services.sales_orders.delete(id).await?;
    Ok(no_content_response())
}

pub async fn approve_sales_order(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let order = state.services.sales_orders.approve(id, actor).await?;
    Ok(success_response(
        ApiResponse::success(order).with_message("Sales order approved"),
    ))
}

pub async fn reject_sales_order(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let order = state.services.sales_orders.reject(id, actor).await?;
    Ok(success_response(
        ApiResponse::success(order).with_message("Sales order rejected"),
    ))
}

/// Marks one sales order item as (partially) delivered
pub async fn update_sales_item_status_partial(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateDeliveryRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let result = state
        .services
        .sales_fulfillment
        .reconcile_item_delivery(item_id, payload.status_partial, payload.delivered_qty, actor)
        .await?;
    Ok(success_response(ApiResponse::success(result)))
}

pub fn sales_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales_orders).post(create_sales_order))
        .route(
            "/:id",
            get(get_sales_order)
                .put(update_sales_order)
                .delete(delete_sales_order),
        )
        .route("/:id/approve", post(approve_sales_order))
        .route("/:id/reject", post(reject_sales_order))
}

pub fn sales_order_item_routes() -> Router<AppState> {
    Router::new().route("/:id/status-partial", patch(update_sales_item_status_partial))
}
