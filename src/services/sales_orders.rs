use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::order_common::{
    parse_status_filter, search_pattern, validate_items, validate_percent, OrderItemInput,
    PageLimits, SortDirection,
};
use super::order_store::{self, OrderPage, OrderTables, OrderWithItems};
use crate::{
    clock::{Clock, SystemClock},
    db::DbPool,
    entities::{
        sales_order::{self, Entity as SalesOrder},
        sales_order_item::{self, Entity as SalesOrderItem},
    },
    errors::ServiceError,
    models::{
        order_totals::{compute_totals, line_subtotal},
        OrderKind, OrderStatus,
    },
};

/// Payload for creating or replacing a sales order
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SalesOrderInput {
    pub customer_id: i32,
    /// Generated when omitted
    #[validate(length(min = 1, max = 64))]
    pub no_so: Option<String>,
    /// Customer's purchase order reference
    #[validate(length(max = 64))]
    pub no_po: Option<String>,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: Option<OrderStatus>,
    #[validate(length(max = 64))]
    pub payment_method: Option<String>,
    #[validate(length(max = 64))]
    pub source: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_percent")]
    pub discount_percent: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_percent")]
    pub tax_percent: Decimal,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub items: Vec<OrderItemInput>,
}

/// Listing filters; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesOrderListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub customer_id: Option<i32>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

pub type SalesOrderWithItems = OrderWithItems<sales_order::Model, sales_order_item::Model>;
pub type SalesOrderPage = OrderPage<sales_order::Model, sales_order_item::Model>;

fn sort_column(field: &str) -> Result<sales_order::Column, ServiceError> {
    match field {
        "date" => Ok(sales_order::Column::Date),
        "due_date" => Ok(sales_order::Column::DueDate),
        "total" => Ok(sales_order::Column::Total),
        "status" => Ok(sales_order::Column::Status),
        "no_so" => Ok(sales_order::Column::NoSo),
        "created_at" => Ok(sales_order::Column::CreatedAt),
        other => Err(ServiceError::ValidationError(format!(
            "Cannot sort sales orders by '{}'",
            other
        ))),
    }
}

/// Column layout of `sales_orders` / `sales_order_items`
pub(crate) struct SalesTables;

impl OrderTables for SalesTables {
    type Order = SalesOrder;
    type Item = SalesOrderItem;
    type ItemModel = sales_order_item::Model;
    type ItemActive = sales_order_item::ActiveModel;

    const KIND: OrderKind = OrderKind::Sales;
    const LABEL: &'static str = "Sales order";

    fn id() -> sales_order::Column {
        sales_order::Column::Id
    }
    fn number() -> sales_order::Column {
        sales_order::Column::NoSo
    }
    fn status() -> sales_order::Column {
        sales_order::Column::Status
    }
    fn description() -> sales_order::Column {
        sales_order::Column::Description
    }
    fn created_at() -> sales_order::Column {
        sales_order::Column::CreatedAt
    }
    fn updated_at() -> sales_order::Column {
        sales_order::Column::UpdatedAt
    }
    fn approved_at() -> sales_order::Column {
        sales_order::Column::ApprovedAt
    }
    fn approved_by() -> sales_order::Column {
        sales_order::Column::ApprovedBy
    }
    fn rejected_at() -> sales_order::Column {
        sales_order::Column::RejectedAt
    }
    fn rejected_by() -> sales_order::Column {
        sales_order::Column::RejectedBy
    }

    fn item_id() -> sales_order_item::Column {
        sales_order_item::Column::Id
    }
    fn item_order_id() -> sales_order_item::Column {
        sales_order_item::Column::SalesOrderId
    }
    fn item_created_at() -> sales_order_item::Column {
        sales_order_item::Column::CreatedAt
    }

    fn order_key(order: &sales_order::Model) -> Uuid {
        order.id
    }
    fn item_parent(item: &sales_order_item::Model) -> Uuid {
        item.sales_order_id
    }

    fn new_item(
        order_id: Uuid,
        input: &OrderItemInput,
        now: DateTime<Utc>,
    ) -> sales_order_item::ActiveModel {
        sales_order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            sales_order_id: Set(order_id),
            product_id: Set(input.product_id),
            warehouse_id: Set(input.warehouse_id),
            quantity: Set(input.quantity),
            delivered_qty: Set(input.fulfilled_qty),
            price: Set(input.price),
            subtotal: Set(line_subtotal(input.quantity, input.price)),
            status_partial: Set(input.status_partial),
            description: Set(input.description.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

/// CRUD and approval workflow for sales orders
#[derive(Clone)]
pub struct SalesOrderService {
    db: Arc<DbPool>,
    clock: Arc<dyn Clock>,
    document_prefix: String,
    limits: PageLimits,
}

impl SalesOrderService {
    pub fn new(db: Arc<DbPool>, document_prefix: impl Into<String>, limits: PageLimits) -> Self {
        Self {
            db,
            clock: Arc::new(SystemClock),
            document_prefix: document_prefix.into(),
            limits,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Creates the order and its items; totals and (if omitted) the document
    /// number are computed here.
    #[instrument(skip(self, input), fields(customer_id = input.customer_id))]
    pub async fn create(
        &self,
        input: SalesOrderInput,
        actor: Option<Uuid>,
    ) -> Result<SalesOrderWithItems, ServiceError> {
        input.validate()?;
        validate_items(&input.items)?;

        let now = self.clock.now();
        let txn = self.db.begin().await?;

        let no_so = match input.no_so.clone() {
            Some(no_so) => {
                order_store::ensure_number_free::<SalesTables>(&txn, &no_so, None).await?;
                no_so
            }
            None => order_store::next_number::<SalesTables>(&txn, &self.document_prefix, now).await?,
        };

        let totals = compute_totals(
            input.items.iter().map(|i| (i.quantity, i.price)),
            input.discount_percent,
            input.tax_percent,
        );

        let order = sales_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(input.customer_id),
            no_so: Set(no_so),
            no_po: Set(input.no_po),
            date: Set(input.date),
            due_date: Set(input.due_date),
            status: Set(input.status.unwrap_or_default().to_string()),
            payment_method: Set(input.payment_method),
            source: Set(input.source),
            discount_percent: Set(input.discount_percent),
            tax_percent: Set(input.tax_percent),
            total: Set(totals.total),
            description: Set(input.description),
            created_by: Set(actor),
            approved_by: Set(None),
            approved_at: Set(None),
            delivered_by: Set(None),
            delivered_at: Set(None),
            rejected_by: Set(None),
            rejected_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let items = order_store::insert_items::<SalesTables>(&txn, order.id, &input.items, now).await?;
        txn.commit().await?;

        counter!("orderdesk.orders.created", 1, "kind" => "sales");
        info!(order_id = %order.id, no_so = %order.no_so, total = %order.total, "Sales order created");

        Ok(SalesOrderWithItems { order, items })
    }

    /// Replaces header fields and the full item list
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: SalesOrderInput,
    ) -> Result<SalesOrderWithItems, ServiceError> {
        input.validate()?;
        validate_items(&input.items)?;

        let now = self.clock.now();
        let txn = self.db.begin().await?;
        let existing = order_store::lock_order::<SalesTables>(&txn, id).await?;

        let no_so = match input.no_so.clone() {
            Some(no_so) if no_so != existing.no_so => {
                order_store::ensure_number_free::<SalesTables>(&txn, &no_so, Some(id)).await?;
                no_so
            }
            _ => existing.no_so.clone(),
        };
        let status = match input.status {
            Some(status) => status.to_string(),
            None => existing.status.clone(),
        };

        let totals = compute_totals(
            input.items.iter().map(|i| (i.quantity, i.price)),
            input.discount_percent,
            input.tax_percent,
        );

        let mut active: sales_order::ActiveModel = existing.into();
        active.customer_id = Set(input.customer_id);
        active.no_so = Set(no_so);
        active.no_po = Set(input.no_po);
        active.date = Set(input.date);
        active.due_date = Set(input.due_date);
        active.status = Set(status);
        active.payment_method = Set(input.payment_method);
        active.source = Set(input.source);
        active.discount_percent = Set(input.discount_percent);
        active.tax_percent = Set(input.tax_percent);
        active.total = Set(totals.total);
        active.description = Set(input.description);
        active.updated_at = Set(now);
        let order = active.update(&txn).await?;

        order_store::delete_items::<SalesTables>(&txn, id).await?;
        let items = order_store::insert_items::<SalesTables>(&txn, id, &input.items, now).await?;

        txn.commit().await?;
        info!(order_id = %id, "Sales order updated");

        Ok(SalesOrderWithItems { order, items })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<SalesOrderWithItems, ServiceError> {
        order_store::find_with_items::<SalesTables, _>(&*self.db, id).await
    }

    /// Paginated listing with filters, search and a fixed set of sort fields
    #[instrument(skip(self))]
    pub async fn list(&self, query: SalesOrderListQuery) -> Result<SalesOrderPage, ServiceError> {
        let (page, per_page) = self.limits.resolve(query.page, query.per_page)?;
        let sort_by = sort_column(query.sort_by.as_deref().unwrap_or("created_at"))?;
        let direction = match query.sort_order.as_deref() {
            Some(order) => order.parse::<SortDirection>()?,
            None => SortDirection::Desc,
        };

        let mut select = SalesOrder::find();
        if let Some(customer_id) = query.customer_id {
            select = select.filter(sales_order::Column::CustomerId.eq(customer_id));
        }
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            let status = parse_status_filter(status)?;
            select = select.filter(sales_order::Column::Status.eq(status.to_string()));
        }
        if let Some(source) = query.source.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(sales_order::Column::Source.eq(source));
        }
        if let Some(pattern) = search_pattern(query.search.as_deref()) {
            select = select.filter(order_store::search_condition::<SalesTables>(&pattern));
        }
        select = match direction {
            SortDirection::Asc => select.order_by_asc(sort_by),
            SortDirection::Desc => select.order_by_desc(sort_by),
        }
        .order_by_asc(sales_order::Column::Id);

        let db = &*self.db;
        let paginator = select.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;
        let orders = order_store::attach_items::<SalesTables, _>(db, orders).await?;

        Ok(SalesOrderPage {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// Deletes the order together with its items
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        order_store::delete_order::<SalesTables>(&self.db, id).await
    }

    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<sales_order::Model, ServiceError> {
        let now = self.clock.now();
        order_store::transition::<SalesTables>(&self.db, id, OrderStatus::Approved, actor, now).await
    }

    #[instrument(skip(self))]
    pub async fn reject(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<sales_order::Model, ServiceError> {
        let now = self.clock.now();
        order_store::transition::<SalesTables>(&self.db, id, OrderStatus::Rejected, actor, now).await
    }
}
