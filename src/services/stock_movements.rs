use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{stock_movement, stock_movement_detail},
    errors::ServiceError,
    repositories::StockMovementRepository,
};

#[derive(Debug, Clone, Serialize)]
pub struct StockMovementWithDetails {
    #[serde(flatten)]
    pub movement: stock_movement::Model,
    pub details: Vec<stock_movement_detail::Model>,
}

/// Read access to the movements recorded by order fulfillment
#[derive(Clone)]
pub struct StockMovementService {
    db: Arc<DbPool>,
    repository: StockMovementRepository,
}

impl StockMovementService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            db,
            repository: StockMovementRepository::new(),
        }
    }

    /// All movement headers for an order, each with its details. An order
    /// with no recorded movements yields an empty list.
    #[instrument(skip(self))]
    pub async fn movements_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<StockMovementWithDetails>, ServiceError> {
        let rows = self.repository.find_for_order(&*self.db, order_id).await?;
        Ok(rows
            .into_iter()
            .map(|(movement, details)| StockMovementWithDetails { movement, details })
            .collect())
    }
}
