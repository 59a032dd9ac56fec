//! Reconciliation of item deliveries and receipts against an in-memory SQLite database.

mod common;

use assert_matches::assert_matches;
use common::{item, purchase_input, sales_input, test_now, test_state};
use orderdesk_api::{errors::ServiceError, models::OrderStatus};
use rust_decimal_macros::dec;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

#[tokio::test]
async fn partial_then_full_delivery_closes_sales_order() {
    let state = test_state().await;
    let services = &state.services;
    let actor = Uuid::new_v4();

    let created = services
        .sales_orders
        .create(
            sales_input(vec![item(1, 10, 5, dec!(20)), item(2, 10, 3, dec!(10))]),
            None,
        )
        .await
        .unwrap();
    let first = created.items[0].id;
    let second = created.items[1].id;

    let after_first = services
        .sales_fulfillment
        .reconcile_item_delivery(first, true, Some(5), Some(actor))
        .await
        .unwrap();
    assert_eq!(after_first.order.status, OrderStatus::Partial);
    assert_eq!(after_first.order.fulfilled_at, None);
    assert_eq!(after_first.item.fulfilled_qty, 5);

    let after_second = services
        .sales_fulfillment
        .reconcile_item_delivery(second, true, Some(3), Some(actor))
        .await
        .unwrap();
    assert_eq!(after_second.order.status, OrderStatus::Delivered);
    assert_eq!(after_second.order.fulfilled_at, Some(test_now()));
    assert_eq!(after_second.order.fulfilled_by, Some(actor));
    assert!(after_second
        .order
        .items
        .iter()
        .all(|l| l.status_partial && l.fulfilled_qty == l.quantity));

    let stored = services.sales_orders.get(created.order.id).await.unwrap();
    assert_eq!(stored.order.status, "delivered");
    assert_eq!(stored.order.delivered_at, Some(test_now()));
    assert_eq!(stored.order.delivered_by, Some(actor));
    assert!(stored.items.iter().all(|i| i.delivered_qty == i.quantity));

    let movements = services
        .stock_movements
        .movements_for_order(created.order.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    let movement = &movements[0];
    assert_eq!(movement.movement.movement_type, "out");
    assert_eq!(movement.movement.warehouse_id, 10);
    assert_eq!(movement.movement.status, "draft");
    assert_eq!(movement.movement.posted_by, Some(actor));
    assert_eq!(
        movement.movement.description.as_deref(),
        Some("Automatic delivery from SO #0001/APU/SO/X/2024")
    );
    assert_eq!(movement.details.len(), 2);
}

#[tokio::test]
async fn repeated_update_is_idempotent_and_overwrites_detail_quantity() {
    let state = test_state().await;
    let services = &state.services;

    let created = services
        .sales_orders
        .create(
            sales_input(vec![item(1, 10, 10, dec!(1)), item(2, 10, 4, dec!(1))]),
            None,
        )
        .await
        .unwrap();
    let target = created.items[0].id;

    let once = services
        .sales_fulfillment
        .reconcile_item_delivery(target, true, Some(4), None)
        .await
        .unwrap();
    let twice = services
        .sales_fulfillment
        .reconcile_item_delivery(target, true, Some(4), None)
        .await
        .unwrap();
    assert_eq!(once.order.status, twice.order.status);
    assert_eq!(once.item, twice.item);

    services
        .sales_fulfillment
        .reconcile_item_delivery(target, true, Some(6), None)
        .await
        .unwrap();

    let movements = services
        .stock_movements
        .movements_for_order(created.order.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].details.len(), 1);
    assert_eq!(movements[0].details[0].product_id, 1);
    assert_eq!(movements[0].details[0].quantity, 6);
}

#[tokio::test]
async fn quantity_above_ordered_is_rejected_without_writes() {
    let state = test_state().await;
    let services = &state.services;

    let created = services
        .sales_orders
        .create(
            sales_input(vec![item(1, 10, 10, dec!(1)), item(2, 10, 1, dec!(1))]),
            None,
        )
        .await
        .unwrap();
    let target = created.items[0].id;

    let result = services
        .sales_fulfillment
        .reconcile_item_delivery(target, true, Some(11), None)
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    let stored = services.sales_orders.get(created.order.id).await.unwrap();
    let unchanged = stored.items.iter().find(|i| i.id == target).unwrap();
    assert_eq!(unchanged.delivered_qty, 0);
    assert!(!unchanged.status_partial);
    assert_eq!(stored.order.status, "draft");
    assert!(services
        .stock_movements
        .movements_for_order(created.order.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn negative_quantity_is_rejected() {
    let state = test_state().await;
    let created = state
        .services
        .sales_orders
        .create(sales_input(vec![item(1, 10, 2, dec!(1))]), None)
        .await
        .unwrap();

    let result = state
        .services
        .sales_fulfillment
        .reconcile_item_delivery(created.items[0].id, false, Some(-1), None)
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn single_item_order_completes_even_when_unchecked() {
    let state = test_state().await;
    let services = &state.services;

    let created = services
        .sales_orders
        .create(sales_input(vec![item(1, 10, 2, dec!(5))]), None)
        .await
        .unwrap();

    let result = services
        .sales_fulfillment
        .reconcile_item_delivery(created.items[0].id, false, None, None)
        .await
        .unwrap();
    assert_eq!(result.order.status, OrderStatus::Delivered);
    assert_eq!(result.order.fulfilled_at, None);
    assert_eq!(result.item.fulfilled_qty, 0);
    assert!(services
        .stock_movements
        .movements_for_order(created.order.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn movement_quantity_falls_back_to_ordered_quantity() {
    let state = test_state().await;
    let services = &state.services;

    let created = services
        .sales_orders
        .create(
            sales_input(vec![item(1, 10, 8, dec!(1)), item(2, 20, 2, dec!(1))]),
            None,
        )
        .await
        .unwrap();

    services
        .sales_fulfillment
        .reconcile_item_delivery(created.items[0].id, true, None, None)
        .await
        .unwrap();

    let movements = services
        .stock_movements
        .movements_for_order(created.order.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].details[0].quantity, 8);
}

#[tokio::test]
async fn closing_out_force_syncs_short_lines() {
    let state = test_state().await;
    let services = &state.services;

    let created = services
        .sales_orders
        .create(
            sales_input(vec![item(1, 10, 5, dec!(1)), item(2, 20, 3, dec!(1))]),
            None,
        )
        .await
        .unwrap();

    services
        .sales_fulfillment
        .reconcile_item_delivery(created.items[0].id, true, Some(2), None)
        .await
        .unwrap();
    let done = services
        .sales_fulfillment
        .reconcile_item_delivery(created.items[1].id, true, Some(3), None)
        .await
        .unwrap();
    assert_eq!(done.order.status, OrderStatus::Delivered);

    let stored = services.sales_orders.get(created.order.id).await.unwrap();
    let first = stored
        .items
        .iter()
        .find(|i| i.id == created.items[0].id)
        .unwrap();
    assert_eq!(first.delivered_qty, 5);

    // One movement per warehouse
    let movements = services
        .stock_movements
        .movements_for_order(created.order.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
}

#[tokio::test]
async fn unchecking_a_line_reopens_the_order() {
    let state = test_state().await;
    let services = &state.services;

    let created = services
        .sales_orders
        .create(
            sales_input(vec![item(1, 10, 1, dec!(1)), item(2, 10, 1, dec!(1))]),
            None,
        )
        .await
        .unwrap();
    for line in &created.items {
        services
            .sales_fulfillment
            .reconcile_item_delivery(line.id, true, Some(1), None)
            .await
            .unwrap();
    }

    let reopened = services
        .sales_fulfillment
        .reconcile_item_delivery(created.items[0].id, false, None, None)
        .await
        .unwrap();
    assert_eq!(reopened.order.status, OrderStatus::Partial);
}

#[tokio::test]
async fn purchase_receipt_marks_order_received() {
    let state = test_state().await;
    let services = &state.services;
    let actor = Uuid::new_v4();

    let created = services
        .purchase_orders
        .create(
            purchase_input(vec![item(5, 30, 4, dec!(2)), item(6, 30, 6, dec!(2))]),
            None,
        )
        .await
        .unwrap();
    assert_eq!(created.order.no_po, "0001/APU/PO/X/2024");

    let partial = services
        .purchase_receipts
        .reconcile_item_delivery(created.items[0].id, true, Some(4), Some(actor))
        .await
        .unwrap();
    assert_eq!(partial.order.status, OrderStatus::Partial);

    let received = services
        .purchase_receipts
        .reconcile_item_delivery(created.items[1].id, true, Some(6), Some(actor))
        .await
        .unwrap();
    assert_eq!(received.order.status, OrderStatus::Received);

    let stored = services.purchase_orders.get(created.order.id).await.unwrap();
    assert_eq!(stored.order.status, "received");
    assert_eq!(stored.order.received_at, Some(test_now()));
    assert_eq!(stored.order.received_by, Some(actor));

    let movements = services
        .stock_movements
        .movements_for_order(created.order.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement.movement_type, "in");
    assert_eq!(
        movements[0].movement.description.as_deref(),
        Some("Automatic receipt from PO #0001/APU/PO/X/2024")
    );
}

#[tokio::test]
async fn unknown_item_is_not_found() {
    let state = test_state().await;
    let result = state
        .services
        .purchase_receipts
        .reconcile_item_delivery(Uuid::new_v4(), true, None, None)
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn sales_item_id_is_unknown_to_purchase_side() {
    let state = test_state().await;
    let created = state
        .services
        .sales_orders
        .create(sales_input(vec![item(1, 10, 1, dec!(1))]), None)
        .await
        .unwrap();

    let result = state
        .services
        .purchase_receipts
        .reconcile_item_delivery(created.items[0].id, true, None, None)
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn short_final_line_posts_ordered_quantity() {
    let state = test_state().await;
    let services = &state.services;

    let created = services
        .sales_orders
        .create(
            sales_input(vec![item(1, 10, 5, dec!(1)), item(2, 10, 3, dec!(1))]),
            None,
        )
        .await
        .unwrap();

    services
        .sales_fulfillment
        .reconcile_item_delivery(created.items[0].id, true, Some(5), None)
        .await
        .unwrap();
    let done = services
        .sales_fulfillment
        .reconcile_item_delivery(created.items[1].id, true, Some(1), None)
        .await
        .unwrap();
    assert_eq!(done.order.status, OrderStatus::Delivered);
    // The closing line is force-synced before its movement is written
    assert_eq!(done.item.fulfilled_qty, 3);

    let movements = services
        .stock_movements
        .movements_for_order(created.order.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    let detail = movements[0]
        .details
        .iter()
        .find(|d| d.product_id == 2)
        .unwrap();
    assert_eq!(detail.quantity, 3);
}

#[tokio::test]
async fn reconcile_rolls_back_when_movement_write_fails() {
    let state = test_state().await;
    let services = &state.services;

    let created = services
        .sales_orders
        .create(
            sales_input(vec![item(1, 10, 5, dec!(1)), item(2, 10, 3, dec!(1))]),
            None,
        )
        .await
        .unwrap();

    state
        .db
        .execute_unprepared(
            "CREATE TRIGGER fail_detail BEFORE INSERT ON stock_movement_details \
             BEGIN SELECT RAISE(ABORT, 'detail insert blocked'); END;",
        )
        .await
        .unwrap();

    let result = services
        .sales_fulfillment
        .reconcile_item_delivery(created.items[0].id, true, Some(5), None)
        .await;
    assert_matches!(result, Err(ServiceError::DatabaseError(_)));

    let stored = services.sales_orders.get(created.order.id).await.unwrap();
    assert_eq!(stored.order.status, "draft");
    let line = stored
        .items
        .iter()
        .find(|i| i.id == created.items[0].id)
        .unwrap();
    assert!(!line.status_partial);
    assert_eq!(line.delivered_qty, 0);
    assert!(services
        .stock_movements
        .movements_for_order(created.order.id)
        .await
        .unwrap()
        .is_empty());
}
