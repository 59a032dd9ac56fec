use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};

use super::common::{success_response, PaginatedResponse};
use crate::{errors::ApiError, services::stocks::StockListQuery, ApiResponse, AppState};

pub async fn list_stocks(
    State(state): State<AppState>,
    Query(query): Query<StockListQuery>,
) -> Result<Response, ApiError> {
    let page = state.services.stocks.list(query).await?;
    Ok(success_response(PaginatedResponse::new(
        page.stocks,
        page.page,
        page.per_page,
        page.total,
    )))
}

/// Stock row counts, overall and per warehouse
pub async fn stock_totals(State(state): State<AppState>) -> Result<Response, ApiError> {
    let totals = state.services.stocks.totals().await?;
    Ok(success_response(ApiResponse::success(totals)))
}

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stocks))
        .route("/total", get(stock_totals))
}
