use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock movement header, one per (movement type, order, warehouse)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// `out` for sales deliveries, `in` for purchase receipts
    pub movement_type: String,
    pub order_id: Uuid,
    pub warehouse_id: i32,
    pub reference_no: String,
    pub posted_by: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub status: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_movement_detail::Entity")]
    StockMovementDetails,
}

impl Related<super::stock_movement_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMovementDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
