use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::OnConflict, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::entities::{
    stock_movement::{self, Entity as StockMovement},
    stock_movement_detail::{self, Entity as StockMovementDetail},
};
use crate::models::MovementType;

/// Header values used only when the movement does not exist yet
#[derive(Debug, Clone)]
pub struct NewStockMovement {
    pub movement_type: MovementType,
    pub order_id: Uuid,
    pub warehouse_id: i32,
    pub reference_no: String,
    pub posted_by: Option<Uuid>,
    pub description: Option<String>,
}

/// Idempotent writes against `stock_movements` / `stock_movement_details`
#[derive(Debug, Clone, Copy, Default)]
pub struct StockMovementRepository;

impl StockMovementRepository {
    pub fn new() -> Self {
        Self
    }

    /// Inserts the header for (movement_type, order, warehouse) unless one
    /// exists, then returns the stored row. An existing header is left as is.
    pub async fn upsert_header<C: ConnectionTrait>(
        &self,
        conn: &C,
        movement: NewStockMovement,
        now: DateTime<Utc>,
    ) -> Result<stock_movement::Model, DbErr> {
        let movement_type = movement.movement_type.to_string();
        let active = stock_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            movement_type: Set(movement_type.clone()),
            order_id: Set(movement.order_id),
            warehouse_id: Set(movement.warehouse_id),
            reference_no: Set(movement.reference_no),
            posted_by: Set(movement.posted_by),
            date: Set(now),
            status: Set("draft".to_string()),
            description: Set(movement.description),
            created_at: Set(now),
        };

        StockMovement::insert(active)
            .on_conflict(
                OnConflict::columns([
                    stock_movement::Column::MovementType,
                    stock_movement::Column::OrderId,
                    stock_movement::Column::WarehouseId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        StockMovement::find()
            .filter(stock_movement::Column::MovementType.eq(movement_type))
            .filter(stock_movement::Column::OrderId.eq(movement.order_id))
            .filter(stock_movement::Column::WarehouseId.eq(movement.warehouse_id))
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("stock movement after upsert".to_string()))
    }

    /// Inserts or overwrites the detail for (movement, product)
    pub async fn upsert_detail<C: ConnectionTrait>(
        &self,
        conn: &C,
        stock_movement_id: Uuid,
        product_id: i32,
        quantity: i32,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<stock_movement_detail::Model, DbErr> {
        let active = stock_movement_detail::ActiveModel {
            id: Set(Uuid::new_v4()),
            stock_movement_id: Set(stock_movement_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            description: Set(description),
            created_at: Set(now),
            updated_at: Set(now),
        };

        StockMovementDetail::insert(active)
            .on_conflict(
                OnConflict::columns([
                    stock_movement_detail::Column::StockMovementId,
                    stock_movement_detail::Column::ProductId,
                ])
                .update_columns([
                    stock_movement_detail::Column::Quantity,
                    stock_movement_detail::Column::Description,
                    stock_movement_detail::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        StockMovementDetail::find()
            .filter(stock_movement_detail::Column::StockMovementId.eq(stock_movement_id))
            .filter(stock_movement_detail::Column::ProductId.eq(product_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound("stock movement detail after upsert".to_string())
            })
    }

    /// Every movement recorded against an order, with its details
    pub async fn find_for_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
    ) -> Result<Vec<(stock_movement::Model, Vec<stock_movement_detail::Model>)>, DbErr> {
        StockMovement::find()
            .filter(stock_movement::Column::OrderId.eq(order_id))
            .order_by_asc(stock_movement::Column::CreatedAt)
            .find_with_related(StockMovementDetail)
            .all(conn)
            .await
    }
}
