use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    clock::{Clock, SystemClock},
    db::DbPool,
    errors::ServiceError,
    models::fulfillment::{apply_fulfillment, FulfillmentLine, FulfillmentOrder},
    models::OrderKind,
    repositories::{
        FulfillmentRepository, NewStockMovement, PurchaseOrderRepository, SalesOrderRepository,
        StockMovementRepository,
    },
};

/// Final state after reconciling one item
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledDelivery {
    pub item: FulfillmentLine,
    pub order: FulfillmentOrder,
}

/// Marks order items as delivered or received and keeps the order status,
/// completion stamp and stock movements in step.
#[derive(Clone)]
pub struct FulfillmentService<R: FulfillmentRepository> {
    db: Arc<DbPool>,
    repository: R,
    movements: StockMovementRepository,
    clock: Arc<dyn Clock>,
}

pub type SalesFulfillmentService = FulfillmentService<SalesOrderRepository>;
pub type PurchaseReceiptService = FulfillmentService<PurchaseOrderRepository>;

impl<R: FulfillmentRepository> FulfillmentService<R> {
    pub fn new(db: Arc<DbPool>, repository: R) -> Self {
        Self {
            db,
            repository,
            movements: StockMovementRepository::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Updates one item's partial flag and fulfilled quantity, then re-derives
    /// the parent order's status from all of its items.
    ///
    /// When `status_partial` is true a stock movement is recorded for the item's
    /// warehouse and product. Everything happens in one transaction with the
    /// order row locked; any error leaves the database untouched.
    #[instrument(skip(self), fields(kind = %self.repository.kind()))]
    pub async fn reconcile_item_delivery(
        &self,
        item_id: Uuid,
        status_partial: bool,
        fulfilled_qty: Option<i32>,
        actor: Option<Uuid>,
    ) -> Result<ReconciledDelivery, ServiceError> {
        let kind = self.repository.kind();
        let txn = self.db.begin().await?;

        let order_id = self
            .repository
            .find_line(&txn, item_id)
            .await?
            .map(|line| line.order_id)
            .ok_or_else(|| item_not_found(kind, item_id))?;

        let mut order = self
            .repository
            .lock_order(&txn, order_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("{} order {} not found", kind_label(kind), order_id))
            })?;

        // Re-read under the order lock
        let mut line = self
            .repository
            .find_line(&txn, item_id)
            .await?
            .ok_or_else(|| item_not_found(kind, item_id))?;

        if let Some(qty) = fulfilled_qty {
            check_quantity(qty, line.quantity)?;
            line.fulfilled_qty = qty;
        }
        line.status_partial = status_partial;

        let now = self.clock.now();
        self.repository.save_line(&txn, &line, now).await?;

        order.items = self.repository.find_lines(&txn, order.id).await?;
        let outcome = apply_fulfillment(&mut order, actor, now);

        if outcome.status_changed() || outcome.closed_out {
            self.repository.save_order(&txn, &order, now).await?;
        }
        for synced in order
            .items
            .iter()
            .filter(|l| outcome.synced_lines.contains(&l.id))
        {
            self.repository.save_line(&txn, synced, now).await?;
        }

        let item = order
            .items
            .iter()
            .find(|l| l.id == item_id)
            .cloned()
            .unwrap_or(line);

        if status_partial {
            self.record_movement(&txn, &order, &item, actor, now).await?;
        }

        txn.commit().await?;

        counter!(
            "orderdesk.fulfillment.reconciled",
            1,
            "kind" => kind.to_string(),
            "status" => outcome.status.to_string()
        );
        info!(
            order_id = %order.id,
            item_id = %item_id,
            previous = %outcome.previous,
            status = %outcome.status,
            closed_out = outcome.closed_out,
            "Order item reconciled"
        );

        Ok(ReconciledDelivery { item, order })
    }

    async fn record_movement(
        &self,
        txn: &DatabaseTransaction,
        order: &FulfillmentOrder,
        item: &FulfillmentLine,
        actor: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let kind = order.kind;
        let description = match kind {
            OrderKind::Sales => format!("Automatic delivery from SO #{}", order.document_no),
            OrderKind::Purchase => format!("Automatic receipt from PO #{}", order.document_no),
        };

        let header = self
            .movements
            .upsert_header(
                txn,
                NewStockMovement {
                    movement_type: kind.movement_type(),
                    order_id: order.id,
                    warehouse_id: item.warehouse_id,
                    reference_no: format!("{}-{}", kind.document_code(), now.timestamp_millis()),
                    posted_by: actor,
                    description: Some(description),
                },
                now,
            )
            .await?;

        self.movements
            .upsert_detail(
                txn,
                header.id,
                item.product_id,
                item.movement_quantity(),
                item.description.clone(),
                now,
            )
            .await?;

        counter!(
            "orderdesk.stock_movement.upserted",
            1,
            "movement_type" => kind.movement_type().to_string()
        );
        Ok(())
    }
}

fn kind_label(kind: OrderKind) -> &'static str {
    match kind {
        OrderKind::Sales => "Sales",
        OrderKind::Purchase => "Purchase",
    }
}

fn item_not_found(kind: OrderKind, item_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("{} order item {} not found", kind_label(kind), item_id))
}

fn check_quantity(qty: i32, ordered: i32) -> Result<(), ServiceError> {
    if qty < 0 {
        return Err(ServiceError::ValidationError(format!(
            "Fulfilled quantity ({}) must not be negative",
            qty
        )));
    }
    if qty > ordered {
        return Err(ServiceError::ValidationError(format!(
            "Fulfilled quantity ({}) must not exceed the ordered quantity ({})",
            qty, ordered
        )));
    }
    Ok(())
}
