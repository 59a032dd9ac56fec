use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use super::order_common::{search_pattern, validate_non_negative, PageLimits, SortDirection};
use crate::{
    clock::{Clock, SystemClock},
    db::DbPool,
    entities::{
        product::{self, Entity as Product},
        stock::{self, Entity as Stock},
    },
    errors::ServiceError,
};

/// Payload for creating or replacing a product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    pub unit_id: i32,
    pub category_id: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "stock_min must not be negative"))]
    pub stock_min: i32,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub price_buy: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub price_sell: Decimal,
    #[serde(default)]
    pub is_service: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Matches name or SKU, case-insensitively
    pub search: Option<String>,
    /// Only products with positive stock in this warehouse
    pub warehouse_id: Option<i32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<product::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

fn sort_column(field: &str) -> Result<product::Column, ServiceError> {
    match field {
        "id" => Ok(product::Column::Id),
        "name" => Ok(product::Column::Name),
        "sku" => Ok(product::Column::Sku),
        "stock_min" => Ok(product::Column::StockMin),
        "price_buy" => Ok(product::Column::PriceBuy),
        "price_sell" => Ok(product::Column::PriceSell),
        "created_at" => Ok(product::Column::CreatedAt),
        other => Err(ServiceError::ValidationError(format!(
            "Cannot sort products by '{}'",
            other
        ))),
    }
}

fn product_not_found(id: i32) -> ServiceError {
    ServiceError::NotFound(format!("Product {} not found", id))
}

/// Product catalogue maintenance
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
    clock: Arc<dyn Clock>,
    limits: PageLimits,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>, limits: PageLimits) -> Self {
        Self {
            db,
            clock: Arc::new(SystemClock),
            limits,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create(&self, input: ProductInput) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let now = self.clock.now();
        let txn = self.db.begin().await?;
        ensure_sku_free(&txn, &input.sku, None).await?;

        let created = product::ActiveModel {
            name: Set(input.name),
            sku: Set(input.sku),
            unit_id: Set(input.unit_id),
            category_id: Set(input.category_id),
            stock_min: Set(input.stock_min),
            price_buy: Set(input.price_buy),
            price_sell: Set(input.price_sell),
            is_service: Set(input.is_service),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        counter!("orderdesk.products.created", 1);
        info!(product_id = created.id, sku = %created.sku, "Product created");
        Ok(created)
    }

    /// Replaces every field; the SKU is only re-checked when it changes
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: ProductInput) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let now = self.clock.now();
        let txn = self.db.begin().await?;
        let existing = Product::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| product_not_found(id))?;

        if input.sku != existing.sku {
            ensure_sku_free(&txn, &input.sku, Some(id)).await?;
        }

        let mut active: product::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.sku = Set(input.sku);
        active.unit_id = Set(input.unit_id);
        active.category_id = Set(input.category_id);
        active.stock_min = Set(input.stock_min);
        active.price_buy = Set(input.price_buy);
        active.price_sell = Set(input.price_sell);
        active.is_service = Set(input.is_service);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(product_id = id, "Product updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| product_not_found(id))
    }

    /// Paginated listing, newest id first unless another sort is given
    #[instrument(skip(self))]
    pub async fn list(&self, query: ProductListQuery) -> Result<ProductPage, ServiceError> {
        let (page, per_page) = self.limits.resolve(query.page, query.per_page)?;
        let sort_by = sort_column(query.sort_by.as_deref().unwrap_or("id"))?;
        let direction = match query.sort_order.as_deref() {
            Some(order) => order.parse::<SortDirection>()?,
            None => SortDirection::Desc,
        };

        let mut select = Product::find();
        if let Some(pattern) = search_pattern(query.search.as_deref()) {
            select = select.filter(
                [product::Column::Name, product::Column::Sku]
                    .into_iter()
                    .fold(Condition::any(), |cond, column| {
                        cond.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern.as_str()))
                    }),
            );
        }
        if let Some(warehouse_id) = query.warehouse_id {
            let stocked = Stock::find()
                .select_only()
                .column(stock::Column::ProductId)
                .filter(stock::Column::WarehouseId.eq(warehouse_id))
                .filter(stock::Column::Quantity.gt(0))
                .into_query();
            select = select.filter(product::Column::Id.in_subquery(stocked));
        }
        select = match direction {
            SortDirection::Asc => select.order_by_asc(sort_by),
            SortDirection::Desc => select.order_by_desc(sort_by),
        };
        if !matches!(sort_by, product::Column::Id) {
            select = select.order_by_desc(product::Column::Id);
        }

        let paginator = select.paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok(ProductPage {
            products,
            total,
            page,
            per_page,
        })
    }

    /// Deletes the product and its stock rows
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        Stock::delete_many()
            .filter(stock::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        let result = Product::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(product_not_found(id));
        }
        txn.commit().await?;
        info!(product_id = id, "Product deleted");
        Ok(())
    }
}

async fn ensure_sku_free<C: ConnectionTrait>(
    conn: &C,
    sku: &str,
    except: Option<i32>,
) -> Result<(), ServiceError> {
    let mut query = Product::find().filter(product::Column::Sku.eq(sku));
    if let Some(id) = except {
        query = query.filter(product::Column::Id.ne(id));
    }
    if query.one(conn).await?.is_some() {
        return Err(ServiceError::ValidationError(format!(
            "SKU '{}' already in use",
            sku
        )));
    }
    Ok(())
}
