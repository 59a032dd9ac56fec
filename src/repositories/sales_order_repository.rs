use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::{status_from_column, FulfillmentRepository};
use crate::entities::{
    sales_order::{self, Entity as SalesOrder},
    sales_order_item::{self, Entity as SalesOrderItem},
};
use crate::models::fulfillment::{FulfillmentLine, FulfillmentOrder};
use crate::models::OrderKind;

/// Delivery-side storage for the reconciler
#[derive(Debug, Clone, Copy, Default)]
pub struct SalesOrderRepository;

impl SalesOrderRepository {
    pub fn new() -> Self {
        Self
    }
}

fn line_from_model(model: sales_order_item::Model) -> FulfillmentLine {
    FulfillmentLine {
        id: model.id,
        order_id: model.sales_order_id,
        product_id: model.product_id,
        warehouse_id: model.warehouse_id,
        quantity: model.quantity,
        fulfilled_qty: model.delivered_qty,
        status_partial: model.status_partial,
        description: model.description,
    }
}

#[async_trait]
impl FulfillmentRepository for SalesOrderRepository {
    fn kind(&self) -> OrderKind {
        OrderKind::Sales
    }

    async fn find_line(
        &self,
        txn: &DatabaseTransaction,
        line_id: Uuid,
    ) -> Result<Option<FulfillmentLine>, DbErr> {
        Ok(SalesOrderItem::find_by_id(line_id)
            .one(txn)
            .await?
            .map(line_from_model))
    }

    async fn lock_order(
        &self,
        txn: &DatabaseTransaction,
        order_id: Uuid,
    ) -> Result<Option<FulfillmentOrder>, DbErr> {
        let Some(order) = SalesOrder::find_by_id(order_id)
            .lock_exclusive()
            .one(txn)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(FulfillmentOrder {
            id: order.id,
            kind: OrderKind::Sales,
            status: status_from_column(&order.status)?,
            document_no: order.no_so,
            fulfilled_at: order.delivered_at,
            fulfilled_by: order.delivered_by,
            items: Vec::new(),
        }))
    }

    async fn find_lines(
        &self,
        txn: &DatabaseTransaction,
        order_id: Uuid,
    ) -> Result<Vec<FulfillmentLine>, DbErr> {
        let items = SalesOrderItem::find()
            .filter(sales_order_item::Column::SalesOrderId.eq(order_id))
            .order_by_asc(sales_order_item::Column::CreatedAt)
            .order_by_asc(sales_order_item::Column::Id)
            .all(txn)
            .await?;
        Ok(items.into_iter().map(line_from_model).collect())
    }

    async fn save_line(
        &self,
        txn: &DatabaseTransaction,
        line: &FulfillmentLine,
        now: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        SalesOrderItem::update_many()
            .col_expr(
                sales_order_item::Column::DeliveredQty,
                Expr::value(line.fulfilled_qty),
            )
            .col_expr(
                sales_order_item::Column::StatusPartial,
                Expr::value(line.status_partial),
            )
            .col_expr(sales_order_item::Column::UpdatedAt, Expr::value(now))
            .filter(sales_order_item::Column::Id.eq(line.id))
            .exec(txn)
            .await?;
        Ok(())
    }

    async fn save_order(
        &self,
        txn: &DatabaseTransaction,
        order: &FulfillmentOrder,
        now: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        SalesOrder::update_many()
            .col_expr(
                sales_order::Column::Status,
                Expr::value(order.status.to_string()),
            )
            .col_expr(
                sales_order::Column::DeliveredAt,
                Expr::value(order.fulfilled_at),
            )
            .col_expr(
                sales_order::Column::DeliveredBy,
                Expr::value(order.fulfilled_by),
            )
            .col_expr(sales_order::Column::UpdatedAt, Expr::value(now))
            .filter(sales_order::Column::Id.eq(order.id))
            .exec(txn)
            .await?;
        Ok(())
    }
}
