#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use orderdesk_api::{
    build_router,
    clock::{Clock, FixedClock},
    config::AppConfig,
    db::{self, DbConfig, DbPool},
    handlers::common::USER_ID_HEADER,
    services::{
        order_common::OrderItemInput, purchase_orders::PurchaseOrderInput,
        sales_orders::SalesOrderInput,
    },
    AppState,
};

/// Instant every service sees as "now" in tests
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 15, 9, 0, 0).unwrap()
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    );
    cfg.db_max_connections = 1;
    cfg.db_min_connections = 1;
    cfg
}

/// Fresh in-memory database with the schema applied.
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn setup_db() -> Arc<DbPool> {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let pool = db::establish_connection_with_config(&config)
        .await
        .expect("in-memory database");
    db::run_migrations(&pool).await.expect("migrations");
    Arc::new(pool)
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(test_now()))
}

pub async fn test_state() -> AppState {
    AppState::with_clock(setup_db().await, test_config(), fixed_clock())
}

pub fn item(product_id: i32, warehouse_id: i32, quantity: i32, price: Decimal) -> OrderItemInput {
    OrderItemInput {
        product_id,
        warehouse_id,
        quantity,
        price,
        description: Some(format!("product {}", product_id)),
        status_partial: false,
        fulfilled_qty: 0,
    }
}

pub fn sales_input(items: Vec<OrderItemInput>) -> SalesOrderInput {
    SalesOrderInput {
        customer_id: 7,
        no_so: None,
        no_po: Some("CUST-PO-1".to_string()),
        date: NaiveDate::from_ymd_opt(2024, 10, 15).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2024, 11, 15),
        status: None,
        payment_method: Some("transfer".to_string()),
        source: Some("web".to_string()),
        discount_percent: Decimal::ZERO,
        tax_percent: Decimal::ZERO,
        description: Some("test order".to_string()),
        items,
    }
}

pub fn purchase_input(items: Vec<OrderItemInput>) -> PurchaseOrderInput {
    PurchaseOrderInput {
        vendor_id: 3,
        no_po: None,
        date: NaiveDate::from_ymd_opt(2024, 10, 15).unwrap(),
        due_date: None,
        status: None,
        payment_method: None,
        discount_percent: Decimal::ZERO,
        tax_percent: Decimal::ZERO,
        description: None,
        items,
    }
}

/// Router wrapper that drives requests through `oneshot`
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let state = test_state().await;
        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        user: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub fn new_user() -> Uuid {
    Uuid::new_v4()
}
