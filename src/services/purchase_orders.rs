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
        purchase_order::{self, Entity as PurchaseOrder},
        purchase_order_item::{self, Entity as PurchaseOrderItem},
    },
    errors::ServiceError,
    models::{
        order_totals::{compute_totals, line_subtotal},
        OrderKind, OrderStatus,
    },
};

/// Payload for creating or replacing a purchase order
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PurchaseOrderInput {
    pub vendor_id: i32,
    /// Generated when omitted
    #[validate(length(min = 1, max = 64))]
    pub no_po: Option<String>,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: Option<OrderStatus>,
    #[validate(length(max = 64))]
    pub payment_method: Option<String>,
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
pub struct PurchaseOrderListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub vendor_id: Option<i32>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

pub type PurchaseOrderWithItems =
    OrderWithItems<purchase_order::Model, purchase_order_item::Model>;
pub type PurchaseOrderPage = OrderPage<purchase_order::Model, purchase_order_item::Model>;

fn sort_column(field: &str) -> Result<purchase_order::Column, ServiceError> {
    match field {
        "date" => Ok(purchase_order::Column::Date),
        "due_date" => Ok(purchase_order::Column::DueDate),
        "total" => Ok(purchase_order::Column::Total),
        "status" => Ok(purchase_order::Column::Status),
        "no_po" => Ok(purchase_order::Column::NoPo),
        "created_at" => Ok(purchase_order::Column::CreatedAt),
        other => Err(ServiceError::ValidationError(format!(
            "Cannot sort purchase orders by '{}'",
            other
        ))),
    }
}

/// Column layout of `purchase_orders` / `purchase_order_items`
pub(crate) struct PurchaseTables;

impl OrderTables for PurchaseTables {
    type Order = PurchaseOrder;
    type Item = PurchaseOrderItem;
    type ItemModel = purchase_order_item::Model;
    type ItemActive = purchase_order_item::ActiveModel;

    const KIND: OrderKind = OrderKind::Purchase;
    const LABEL: &'static str = "Purchase order";

    fn id() -> purchase_order::Column {
        purchase_order::Column::Id
    }
    fn number() -> purchase_order::Column {
        purchase_order::Column::NoPo
    }
    fn status() -> purchase_order::Column {
        purchase_order::Column::Status
    }
    fn description() -> purchase_order::Column {
        purchase_order::Column::Description
    }
    fn created_at() -> purchase_order::Column {
        purchase_order::Column::CreatedAt
    }
    fn updated_at() -> purchase_order::Column {
        purchase_order::Column::UpdatedAt
    }
    fn approved_at() -> purchase_order::Column {
        purchase_order::Column::ApprovedAt
    }
    fn approved_by() -> purchase_order::Column {
        purchase_order::Column::ApprovedBy
    }
    fn rejected_at() -> purchase_order::Column {
        purchase_order::Column::RejectedAt
    }
    fn rejected_by() -> purchase_order::Column {
        purchase_order::Column::RejectedBy
    }

    fn item_id() -> purchase_order_item::Column {
        purchase_order_item::Column::Id
    }
    fn item_order_id() -> purchase_order_item::Column {
        purchase_order_item::Column::PurchaseOrderId
    }
    fn item_created_at() -> purchase_order_item::Column {
        purchase_order_item::Column::CreatedAt
    }

    fn order_key(order: &purchase_order::Model) -> Uuid {
        order.id
    }
    fn item_parent(item: &purchase_order_item::Model) -> Uuid {
        item.purchase_order_id
    }

    fn new_item(
        order_id: Uuid,
        input: &OrderItemInput,
        now: DateTime<Utc>,
    ) -> purchase_order_item::ActiveModel {
        purchase_order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_order_id: Set(order_id),
            product_id: Set(input.product_id),
            warehouse_id: Set(input.warehouse_id),
            quantity: Set(input.quantity),
            received_qty: Set(input.fulfilled_qty),
            price: Set(input.price),
            subtotal: Set(line_subtotal(input.quantity, input.price)),
            status_partial: Set(input.status_partial),
            description: Set(input.description.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

/// CRUD and approval workflow for purchase orders
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DbPool>,
    clock: Arc<dyn Clock>,
    document_prefix: String,
    limits: PageLimits,
}

impl PurchaseOrderService {
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
    #[instrument(skip(self, input), fields(vendor_id = input.vendor_id))]
    pub async fn create(
        &self,
        input: PurchaseOrderInput,
        actor: Option<Uuid>,
    ) -> Result<PurchaseOrderWithItems, ServiceError> {
        input.validate()?;
        validate_items(&input.items)?;

        let now = self.clock.now();
        let txn = self.db.begin().await?;

        let no_po = match input.no_po.clone() {
            Some(no_po) => {
                order_store::ensure_number_free::<PurchaseTables>(&txn, &no_po, None).await?;
                no_po
            }
            None => order_store::next_number::<PurchaseTables>(&txn, &self.document_prefix, now).await?,
        };

        let totals = compute_totals(
            input.items.iter().map(|i| (i.quantity, i.price)),
            input.discount_percent,
            input.tax_percent,
        );

        let order = purchase_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(input.vendor_id),
            no_po: Set(no_po),
            date: Set(input.date),
            due_date: Set(input.due_date),
            status: Set(input.status.unwrap_or_default().to_string()),
            payment_method: Set(input.payment_method),
            discount_percent: Set(input.discount_percent),
            tax_percent: Set(input.tax_percent),
            total: Set(totals.total),
            description: Set(input.description),
            created_by: Set(actor),
            approved_by: Set(None),
            approved_at: Set(None),
            received_by: Set(None),
            received_at: Set(None),
            rejected_by: Set(None),
            rejected_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let items = order_store::insert_items::<PurchaseTables>(&txn, order.id, &input.items, now).await?;
        txn.commit().await?;

        counter!("orderdesk.orders.created", 1, "kind" => "purchase");
        info!(order_id = %order.id, no_po = %order.no_po, total = %order.total, "Purchase order created");

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// Replaces header fields and the full item list
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: PurchaseOrderInput,
    ) -> Result<PurchaseOrderWithItems, ServiceError> {
        input.validate()?;
        validate_items(&input.items)?;

        let now = self.clock.now();
        let txn = self.db.begin().await?;
        let existing = order_store::lock_order::<PurchaseTables>(&txn, id).await?;

        let no_po = match input.no_po.clone() {
            Some(no_po) if no_po != existing.no_po => {
                order_store::ensure_number_free::<PurchaseTables>(&txn, &no_po, Some(id)).await?;
                no_po
            }
            _ => existing.no_po.clone(),
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

        let mut active: purchase_order::ActiveModel = existing.into();
        active.vendor_id = Set(input.vendor_id);
        active.no_po = Set(no_po);
        active.date = Set(input.date);
        active.due_date = Set(input.due_date);
        active.status = Set(status);
        active.payment_method = Set(input.payment_method);
        active.discount_percent = Set(input.discount_percent);
        active.tax_percent = Set(input.tax_percent);
        active.total = Set(totals.total);
        active.description = Set(input.description);
        active.updated_at = Set(now);
        let order = active.update(&txn).await?;

        order_store::delete_items::<PurchaseTables>(&txn, id).await?;
        let items = order_store::insert_items::<PurchaseTables>(&txn, id, &input.items, now).await?;

        txn.commit().await?;
        info!(order_id = %id, "Purchase order updated");

        Ok(PurchaseOrderWithItems { order, items })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<PurchaseOrderWithItems, ServiceError> {
        order_store::find_with_items::<PurchaseTables, _>(&*self.db, id).await
    }

    /// Paginated listing with filters, search and a fixed set of sort fields
    #[instrument(skip(self))]
    pub async fn list(&self, query: PurchaseOrderListQuery) -> Result<PurchaseOrderPage, ServiceError> {
        let (page, per_page) = self.limits.resolve(query.page, query.per_page)?;
        let sort_by = sort_column(query.sort_by.as_deref().unwrap_or("created_at"))?;
        let direction = match query.sort_order.as_deref() {
            Some(order) => order.parse::<SortDirection>()?,
            None => SortDirection::Desc,
        };

        let mut select = PurchaseOrder::find();
        if let Some(vendor_id) = query.vendor_id {
            select = select.filter(purchase_order::Column::VendorId.eq(vendor_id));
        }
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            let status = parse_status_filter(status)?;
            select = select.filter(purchase_order::Column::Status.eq(status.to_string()));
        }
        if let Some(pattern) = search_pattern(query.search.as_deref()) {
            select = select.filter(order_store::search_condition::<PurchaseTables>(&pattern));
        }
        select = match direction {
            SortDirection::Asc => select.order_by_asc(sort_by),
            SortDirection::Desc => select.order_by_desc(sort_by),
        }
        .order_by_asc(purchase_order::Column::Id);

        let db = &*self.db;
        let paginator = select.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;
        let orders = order_store::attach_items::<PurchaseTables, _>(db, orders).await?;

        Ok(PurchaseOrderPage {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// Deletes the order together with its items
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        order_store::delete_order::<PurchaseTables>(&self.db, id).await
    }

    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<purchase_order::Model, ServiceError> {
        let now = self.clock.now();
        order_store::transition::<PurchaseTables>(&self.db, id, OrderStatus::Approved, actor, now).await
    }

    #[instrument(skip(self))]
    pub async fn reject(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<purchase_order::Model, ServiceError> {
        let now = self.clock.now();
        order_store::transition::<PurchaseTables>(&self.db, id, OrderStatus::Rejected, actor, now).await
    }
}
