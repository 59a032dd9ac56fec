use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use tracing::info;

use super::common::{
    created_response, no_content_response, success_response, validate_input, PaginatedResponse,
};
use crate::{
    errors::ApiError,
    services::products::{ProductInput, ProductListQuery},
    ApiResponse, AppState,
};

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Response, ApiError> {
    let page = state.services.products.list(query).await?;
    Ok(success_response(PaginatedResponse::new(
        page.products,
        page.page,
        page.per_page,
        page.total,
    )))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let product = state.services.products.create(payload).await?;
    info!(product_id = product.id, "Product created via API");
    Ok(created_response(ApiResponse::success(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let product = state.services.products.get(id).await?;
    Ok(success_response(ApiResponse::success(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let product = state.services.products.update(id, payload).await?;
    Ok(success_response(ApiResponse::success(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state.services.products.delete(id).await?;
    Ok(no_content_response())
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}
