//! Product catalogue and stock balance queries.

mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::{response_json, test_now, test_state, TestApp};
use orderdesk_api::{
    entities::stock,
    errors::ServiceError,
    services::{
        products::{ProductInput, ProductListQuery},
        stocks::{StockListQuery, WarehouseStockCount},
    },
    AppState,
};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::json;

fn product(name: &str, sku: &str) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        sku: sku.to_string(),
        unit_id: 1,
        category_id: 2,
        stock_min: 5,
        price_buy: dec!(8.5),
        price_sell: dec!(12),
        is_service: false,
    }
}

async fn put_stock(state: &AppState, product_id: i32, warehouse_id: i32, quantity: i32) {
    stock::ActiveModel {
        product_id: Set(product_id),
        warehouse_id: Set(warehouse_id),
        quantity: Set(quantity),
        created_at: Set(test_now()),
        updated_at: Set(test_now()),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .unwrap();
}

#[tokio::test]
async fn sku_must_be_unique() {
    let state = test_state().await;
    let products = &state.services.products;

    let bolt = products.create(product("Bolt", "BLT-01")).await.unwrap();
    let nut = products.create(product("Nut", "NUT-01")).await.unwrap();
    assert_eq!(bolt.created_at, test_now());

    assert_matches!(
        products.create(product("Other bolt", "BLT-01")).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        products.update(nut.id, product("Nut", "BLT-01")).await,
        Err(ServiceError::ValidationError(_))
    );

    // Keeping its own SKU is not a conflict
    let renamed = products
        .update(bolt.id, product("Hex bolt", "BLT-01"))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Hex bolt");
    assert_eq!(renamed.price_sell, dec!(12));
}

#[tokio::test]
async fn list_searches_and_filters_by_warehouse_stock() {
    let state = test_state().await;
    let products = &state.services.products;

    let bolt = products.create(product("Bolt", "BLT-01")).await.unwrap();
    let nut = products.create(product("Nut", "NUT-01")).await.unwrap();
    let washer = products.create(product("Washer", "WSH-01")).await.unwrap();
    put_stock(&state, bolt.id, 1, 5).await;
    put_stock(&state, nut.id, 1, 0).await;
    put_stock(&state, washer.id, 2, 4).await;

    let all = products.list(ProductListQuery::default()).await.unwrap();
    assert_eq!(all.total, 3);
    let ids: Vec<i32> = all.products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![washer.id, nut.id, bolt.id]);

    let in_first = products
        .list(ProductListQuery {
            warehouse_id: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(in_first.total, 1);
    assert_eq!(in_first.products[0].id, bolt.id);

    let searched = products
        .list(ProductListQuery {
            search: Some("nut".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(searched.total, 1);
    assert_eq!(searched.products[0].sku, "NUT-01");

    let by_name = products
        .list(ProductListQuery {
            sort_by: Some("name".to_string()),
            sort_order: Some("asc".to_string()),
            per_page: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_name.total, 3);
    assert_eq!(by_name.products.len(), 2);
    assert_eq!(by_name.products[0].name, "Bolt");

    assert_matches!(
        products
            .list(ProductListQuery {
                sort_by: Some("image".to_string()),
                ..Default::default()
            })
            .await,
        Err(ServiceError::ValidationError(_))
    );
}

#[tokio::test]
async fn delete_removes_product_and_stock() {
    let state = test_state().await;
    let services = &state.services;

    let bolt = services.products.create(product("Bolt", "BLT-01")).await.unwrap();
    put_stock(&state, bolt.id, 1, 5).await;

    services.products.delete(bolt.id).await.unwrap();
    assert_matches!(
        services.products.get(bolt.id).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        services.products.delete(bolt.id).await,
        Err(ServiceError::NotFound(_))
    );
    assert_eq!(services.stocks.totals().await.unwrap().total, 0);
}

#[tokio::test]
async fn stock_list_filters_and_counts_per_warehouse() {
    let state = test_state().await;
    let services = &state.services;

    let bolt = services.products.create(product("Bolt", "BLT-01")).await.unwrap();
    let nut = services.products.create(product("Nut", "NUT-01")).await.unwrap();
    put_stock(&state, bolt.id, 1, 5).await;
    put_stock(&state, bolt.id, 2, 1).await;
    put_stock(&state, nut.id, 2, 0).await;

    let in_second = services
        .stocks
        .list(StockListQuery {
            warehouse_id: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(in_second.total, 2);
    assert!(in_second.stocks.iter().all(|s| s.stock.warehouse_id == 2));

    let for_bolt = services
        .stocks
        .list(StockListQuery {
            product_id: Some(bolt.id),
            sort_by: Some("quantity".to_string()),
            sort_order: Some("asc".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(for_bolt.total, 2);
    assert_eq!(for_bolt.stocks[0].stock.quantity, 1);
    assert_eq!(
        for_bolt.stocks[0].product.as_ref().map(|p| p.sku.as_str()),
        Some("BLT-01")
    );

    let everything = services
        .stocks
        .list(StockListQuery {
            per_page: Some(1),
            all: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(everything.stocks.len(), 3);
    assert_eq!(everything.page, 1);

    let totals = services.stocks.totals().await.unwrap();
    assert_eq!(totals.total, 3);
    assert_eq!(
        totals.per_warehouse,
        vec![
            WarehouseStockCount {
                warehouse_id: 1,
                total: 1
            },
            WarehouseStockCount {
                warehouse_id: 2,
                total: 2
            },
        ]
    );
}

#[tokio::test]
async fn product_routes_report_duplicate_sku() {
    let app = TestApp::new().await;
    let payload = json!({
        "name": "Bolt",
        "sku": "BLT-01",
        "unit_id": 1,
        "category_id": 1,
        "price_buy": "1.50",
        "price_sell": "2.00",
    });

    let response = app
        .request(Method::POST, "/api/v1/products", Some(payload.clone()), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["sku"], "BLT-01");
    assert_eq!(body["data"]["is_service"], false);
    let id = body["data"]["id"].as_i64().unwrap();

    let response = app
        .request(Method::POST, "/api/v1/products", Some(payload), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(Method::GET, &format!("/api/v1/products/{}", id), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, "/api/v1/products?search=blt", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["pagination"]["total"], 1);

    let response = app
        .request(Method::DELETE, &format!("/api/v1/products/{}", id), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn stock_total_route_returns_counts() {
    let app = TestApp::new().await;
    let bolt = app
        .state
        .services
        .products
        .create(product("Bolt", "BLT-01"))
        .await
        .unwrap();
    put_stock(&app.state, bolt.id, 4, 10).await;

    let response = app
        .request(Method::GET, "/api/v1/stocks/total", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["per_warehouse"][0]["warehouse_id"], 4);
    assert_eq!(body["data"]["per_warehouse"][0]["total"], 1);

    let response = app
        .request(Method::GET, "/api/v1/stocks?all=true", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"][0]["product"]["sku"], "BLT-01");
}
