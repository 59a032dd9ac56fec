use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseTransaction, EntityTrait, IntoActiveModel, ModelTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use super::order_common::OrderItemInput;
use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{
        document_number::{month_bounds, next_document_number},
        OrderKind, OrderStatus,
    },
};

type OrderColumn<T> = <<T as OrderTables>::Order as EntityTrait>::Column;
type ItemColumn<T> = <<T as OrderTables>::Item as EntityTrait>::Column;
pub(crate) type OrderModel<T> = <<T as OrderTables>::Order as EntityTrait>::Model;

/// An order header together with its line items
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems<O, I> {
    #[serde(flatten)]
    pub order: O,
    pub items: Vec<I>,
}

/// One page of orders plus the unpaginated match count
#[derive(Debug, Clone, Serialize)]
pub struct OrderPage<O, I> {
    pub orders: Vec<OrderWithItems<O, I>>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Table layout shared by sales and purchase orders.
///
/// Both kinds keep a header table and an item table with the same
/// lifecycle columns; only the column names and the item shape differ.
pub(crate) trait OrderTables: Send + Sync + 'static {
    type Order: EntityTrait;
    type Item: EntityTrait<Model = Self::ItemModel, ActiveModel = Self::ItemActive>;
    type ItemModel: ModelTrait<Entity = Self::Item> + IntoActiveModel<Self::ItemActive>;
    type ItemActive: ActiveModelTrait<Entity = Self::Item> + ActiveModelBehavior + Send + 'static;

    const KIND: OrderKind;
    /// Human label used in errors and logs, e.g. "Sales order"
    const LABEL: &'static str;

    fn id() -> OrderColumn<Self>;
    fn number() -> OrderColumn<Self>;
    fn status() -> OrderColumn<Self>;
    fn description() -> OrderColumn<Self>;
    fn created_at() -> OrderColumn<Self>;
    fn updated_at() -> OrderColumn<Self>;
    fn approved_at() -> OrderColumn<Self>;
    fn approved_by() -> OrderColumn<Self>;
    fn rejected_at() -> OrderColumn<Self>;
    fn rejected_by() -> OrderColumn<Self>;

    fn item_id() -> ItemColumn<Self>;
    fn item_order_id() -> ItemColumn<Self>;
    fn item_created_at() -> ItemColumn<Self>;

    fn order_key(order: &OrderModel<Self>) -> Uuid;
    fn item_parent(item: &Self::ItemModel) -> Uuid;
    fn new_item(order_id: Uuid, input: &OrderItemInput, now: DateTime<Utc>) -> Self::ItemActive;
}

pub(crate) fn order_not_found<T: OrderTables>(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("{} {} not found", T::LABEL, id))
}

/// Next free document number for the month of `now`
pub(crate) async fn next_number<T: OrderTables>(
    txn: &DatabaseTransaction,
    prefix: &str,
    now: DateTime<Utc>,
) -> Result<String, ServiceError> {
    let (start, end) = month_bounds(now);
    let issued: Vec<String> = T::Order::find()
        .select_only()
        .column(T::number())
        .filter(T::created_at().gte(start))
        .filter(T::created_at().lt(end))
        .into_tuple()
        .all(txn)
        .await?;
    Ok(next_document_number(
        issued.iter().map(String::as_str),
        prefix,
        T::KIND,
        now,
    ))
}

/// Case-insensitive match on document number, status or description
pub(crate) fn search_condition<T: OrderTables>(pattern: &str) -> Condition {
    [T::number(), T::status(), T::description()]
        .into_iter()
        .fold(Condition::any(), |cond, column| {
            cond.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern))
        })
}

/// Rejects a document number already held by another order
pub(crate) async fn ensure_number_free<T: OrderTables>(
    txn: &DatabaseTransaction,
    number: &str,
    except: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = T::Order::find().filter(T::number().eq(number));
    if let Some(id) = except {
        query = query.filter(T::id().ne(id));
    }
    if query.one(txn).await?.is_some() {
        return Err(ServiceError::ValidationError(format!(
            "{} number '{}' is already in use",
            T::LABEL,
            number
        )));
    }
    Ok(())
}

/// Inserts the items in input order and returns the stored rows
pub(crate) async fn insert_items<T: OrderTables>(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    items: &[OrderItemInput],
    now: DateTime<Utc>,
) -> Result<Vec<T::ItemModel>, ServiceError> {
    let mut stored = Vec::with_capacity(items.len());
    for item in items {
        stored.push(T::new_item(order_id, item, now).insert(txn).await?);
    }
    Ok(stored)
}

pub(crate) async fn delete_items<T: OrderTables>(
    txn: &DatabaseTransaction,
    order_id: Uuid,
) -> Result<(), ServiceError> {
    T::Item::delete_many()
        .filter(T::item_order_id().eq(order_id))
        .exec(txn)
        .await?;
    Ok(())
}

/// Header with a row lock held until the transaction ends
pub(crate) async fn lock_order<T: OrderTables>(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<OrderModel<T>, ServiceError> {
    T::Order::find()
        .filter(T::id().eq(id))
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| order_not_found::<T>(id))
}

pub(crate) async fn find_with_items<T: OrderTables, C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<OrderWithItems<OrderModel<T>, T::ItemModel>, ServiceError> {
    let order = T::Order::find()
        .filter(T::id().eq(id))
        .one(conn)
        .await?
        .ok_or_else(|| order_not_found::<T>(id))?;
    let items = T::Item::find()
        .filter(T::item_order_id().eq(id))
        .order_by_asc(T::item_created_at())
        .order_by_asc(T::item_id())
        .all(conn)
        .await?;
    Ok(OrderWithItems { order, items })
}

/// Attaches items to a page of headers with one query
pub(crate) async fn attach_items<T: OrderTables, C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel<T>>,
) -> Result<Vec<OrderWithItems<OrderModel<T>, T::ItemModel>>, ServiceError> {
    let ids: Vec<Uuid> = orders.iter().map(T::order_key).collect();
    let mut by_order: HashMap<Uuid, Vec<T::ItemModel>> = HashMap::new();
    if !ids.is_empty() {
        let items = T::Item::find()
            .filter(T::item_order_id().is_in(ids))
            .order_by_asc(T::item_created_at())
            .order_by_asc(T::item_id())
            .all(conn)
            .await?;
        for item in items {
            by_order.entry(T::item_parent(&item)).or_default().push(item);
        }
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&T::order_key(&order)).unwrap_or_default();
            OrderWithItems { order, items }
        })
        .collect())
}

/// Removes the order together with its items
pub(crate) async fn delete_order<T: OrderTables>(db: &DbPool, id: Uuid) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    delete_items::<T>(&txn, id).await?;
    let result = T::Order::delete_many()
        .filter(T::id().eq(id))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(order_not_found::<T>(id));
    }
    txn.commit().await?;
    info!(order_id = %id, kind = %T::KIND, "Order deleted");
    Ok(())
}

/// Approves or rejects an order, stamping the time and acting user
pub(crate) async fn transition<T: OrderTables>(
    db: &DbPool,
    id: Uuid,
    status: OrderStatus,
    actor: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<OrderModel<T>, ServiceError> {
    let (at_column, by_column) = match status {
        OrderStatus::Approved => (T::approved_at(), T::approved_by()),
        OrderStatus::Rejected => (T::rejected_at(), T::rejected_by()),
        other => {
            return Err(ServiceError::InvalidStatus(format!(
                "{} cannot be moved to '{}' directly",
                T::LABEL,
                other
            )))
        }
    };

    let txn = db.begin().await?;
    lock_order::<T>(&txn, id).await?;

    T::Order::update_many()
        .col_expr(T::status(), Expr::value(status.to_string()))
        .col_expr(at_column, Expr::value(Some(now)))
        .col_expr(by_column, Expr::value(actor))
        .col_expr(T::updated_at(), Expr::value(now))
        .filter(T::id().eq(id))
        .exec(&txn)
        .await?;

    let order = T::Order::find()
        .filter(T::id().eq(id))
        .one(&txn)
        .await?
        .ok_or_else(|| order_not_found::<T>(id))?;
    txn.commit().await?;

    info!(order_id = %id, kind = %T::KIND, status = %status, "Order status changed");
    Ok(order)
}
