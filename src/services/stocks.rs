use sea_orm::{
    sea_query::Expr, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

use super::order_common::{PageLimits, SortDirection};
use crate::{
    db::DbPool,
    entities::{
        product,
        stock::{self, Entity as Stock},
    },
    errors::ServiceError,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub product_id: Option<i32>,
    pub warehouse_id: Option<i32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    /// Return every matching row on one page
    #[serde(default)]
    pub all: bool,
}

/// Stock row with its product, when the product still exists
#[derive(Debug, Clone, Serialize)]
pub struct StockWithProduct {
    #[serde(flatten)]
    pub stock: stock::Model,
    pub product: Option<product::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockPage {
    pub stocks: Vec<StockWithProduct>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarehouseStockCount {
    pub warehouse_id: i32,
    pub total: u64,
}

/// Number of stock rows overall and per warehouse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockTotals {
    pub total: u64,
    pub per_warehouse: Vec<WarehouseStockCount>,
}

fn sort_column(field: &str) -> Result<stock::Column, ServiceError> {
    match field {
        "id" => Ok(stock::Column::Id),
        "product_id" => Ok(stock::Column::ProductId),
        "warehouse_id" => Ok(stock::Column::WarehouseId),
        "quantity" => Ok(stock::Column::Quantity),
        "updated_at" => Ok(stock::Column::UpdatedAt),
        other => Err(ServiceError::ValidationError(format!(
            "Cannot sort stocks by '{}'",
            other
        ))),
    }
}

/// Read-only queries over per-warehouse stock balances
#[derive(Clone)]
pub struct StockService {
    db: Arc<DbPool>,
    limits: PageLimits,
}

impl StockService {
    pub fn new(db: Arc<DbPool>, limits: PageLimits) -> Self {
        Self { db, limits }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: StockListQuery) -> Result<StockPage, ServiceError> {
        let sort_by = sort_column(query.sort_by.as_deref().unwrap_or("id"))?;
        let direction = match query.sort_order.as_deref() {
            Some(order) => order.parse::<SortDirection>()?,
            None => SortDirection::Desc,
        };

        let mut select = Stock::find();
        if let Some(product_id) = query.product_id {
            select = select.filter(stock::Column::ProductId.eq(product_id));
        }
        if let Some(warehouse_id) = query.warehouse_id {
            select = select.filter(stock::Column::WarehouseId.eq(warehouse_id));
        }
        select = match direction {
            SortDirection::Asc => select.order_by_asc(sort_by),
            SortDirection::Desc => select.order_by_desc(sort_by),
        };
        if !matches!(sort_by, stock::Column::Id) {
            select = select.order_by_desc(stock::Column::Id);
        }
        let select = select.find_also_related(product::Entity);
        let db = &*self.db;

        let (rows, total, page, per_page) = if query.all {
            let rows = select.all(db).await?;
            let total = rows.len() as u64;
            (rows, total, 1, total)
        } else {
            let (page, per_page) = self.limits.resolve(query.page, query.per_page)?;
            let paginator = select.paginate(db, per_page);
            let total = paginator.num_items().await?;
            (paginator.fetch_page(page - 1).await?, total, page, per_page)
        };

        Ok(StockPage {
            stocks: rows
                .into_iter()
                .map(|(stock, product)| StockWithProduct { stock, product })
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Counts stock rows, not quantities
    #[instrument(skip(self))]
    pub async fn totals(&self) -> Result<StockTotals, ServiceError> {
        let db = &*self.db;
        let total = Stock::find().count(db).await?;
        let grouped: Vec<(i32, i64)> = Stock::find()
            .select_only()
            .column(stock::Column::WarehouseId)
            .column_as(Expr::col(stock::Column::Id).count(), "total")
            .group_by(stock::Column::WarehouseId)
            .order_by_asc(stock::Column::WarehouseId)
            .into_tuple()
            .all(db)
            .await?;

        Ok(StockTotals {
            total,
            per_warehouse: grouped
                .into_iter()
                .map(|(warehouse_id, total)| WarehouseStockCount {
                    warehouse_id,
                    total: u64::try_from(total).unwrap_or_default(),
                })
                .collect(),
        })
    }
}
