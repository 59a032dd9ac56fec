use axum::{routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

pub mod clock;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod repositories;
pub mod services;
pub mod telemetry;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config);
        Self {
            db,
            config,
            services,
        }
    }

    /// Same as [`AppState::new`] but with an explicit clock for every service
    pub fn with_clock(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        clock: Arc<dyn clock::Clock>,
    ) -> Self {
        let services = handlers::AppServices::with_clock(db.clone(), &config, clock);
        Self {
            db,
            config,
            services,
        }
    }
}

/// Envelope for successful JSON responses
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: telemetry::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/sales-orders",
            handlers::sales_orders::sales_order_routes(),
        )
        .nest(
            "/sales-order-items",
            handlers::sales_orders::sales_order_item_routes(),
        )
        .nest(
            "/purchase-orders",
            handlers::purchase_orders::purchase_order_routes(),
        )
        .nest(
            "/purchase-order-items",
            handlers::purchase_orders::purchase_order_item_routes(),
        )
        .nest("/orders", handlers::stock_movements::stock_movement_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/stocks", handlers::stocks::stock_routes())
        .route("/health", get(handlers::health::health_check))
}

/// Full application router with request-id propagation and HTTP tracing
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api_v1_routes())
        .layer(telemetry::configure_http_tracing())
        .layer(axum::middleware::from_fn(telemetry::request_id_middleware))
        .with_state(state)
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            telemetry::scope_request_id(telemetry::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn message_is_optional() {
        let response = ApiResponse::success(1).with_message("done");
        assert_eq!(response.message.as_deref(), Some("done"));
        assert!(response.success);
    }
}
