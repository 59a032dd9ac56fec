use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use uuid::Uuid;

use super::common::success_response;
use crate::{errors::ApiError, ApiResponse, AppState};

pub async fn list_order_stock_movements(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let movements = state
        .services
        .stock_movements
        .movements_for_order(order_id)
        .await?;
    Ok(success_response(ApiResponse::success(movements)))
}

pub fn stock_movement_routes() -> Router<AppState> {
    Router::new().route("/:id/stock-movements", get(list_order_stock_movements))
}
