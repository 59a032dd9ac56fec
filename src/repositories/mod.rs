use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, DbErr};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::fulfillment::{FulfillmentLine, FulfillmentOrder};
use crate::models::{OrderKind, OrderStatus};

pub mod purchase_order_repository;
pub mod sales_order_repository;
pub mod stock_movement_repository;

pub use purchase_order_repository::PurchaseOrderRepository;
pub use sales_order_repository::SalesOrderRepository;
pub use stock_movement_repository::{NewStockMovement, StockMovementRepository};

/// Storage seam for the fulfillment reconciler.
///
/// Every call runs inside the caller's transaction.
#[async_trait]
pub trait FulfillmentRepository: Send + Sync {
    fn kind(&self) -> OrderKind;

    async fn find_line(
        &self,
        txn: &DatabaseTransaction,
        line_id: Uuid,
    ) -> Result<Option<FulfillmentLine>, DbErr>;

    /// Loads the order header with a row lock held until the transaction ends.
    /// `items` is left empty.
    async fn lock_order(
        &self,
        txn: &DatabaseTransaction,
        order_id: Uuid,
    ) -> Result<Option<FulfillmentOrder>, DbErr>;

    async fn find_lines(
        &self,
        txn: &DatabaseTransaction,
        order_id: Uuid,
    ) -> Result<Vec<FulfillmentLine>, DbErr>;

    async fn save_line(
        &self,
        txn: &DatabaseTransaction,
        line: &FulfillmentLine,
        now: DateTime<Utc>,
    ) -> Result<(), DbErr>;

    async fn save_order(
        &self,
        txn: &DatabaseTransaction,
        order: &FulfillmentOrder,
        now: DateTime<Utc>,
    ) -> Result<(), DbErr>;
}

/// Parses a status column, surfacing unknown values as a storage error
pub(crate) fn status_from_column(value: &str) -> Result<OrderStatus, DbErr> {
    OrderStatus::from_str(value)
        .map_err(|_| DbErr::Custom(format!("unknown order status '{}'", value)))
}
