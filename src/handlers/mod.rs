use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    config::AppConfig,
    db::DbPool,
    repositories::{PurchaseOrderRepository, SalesOrderRepository},
    services::{
        fulfillment::{PurchaseReceiptService, SalesFulfillmentService},
        order_common::PageLimits,
        products::ProductService,
        purchase_orders::PurchaseOrderService,
        sales_orders::SalesOrderService,
        stock_movements::StockMovementService,
        stocks::StockService,
    },
};

pub mod common;
pub mod health;
pub mod products;
pub mod purchase_orders;
pub mod sales_orders;
pub mod stock_movements;
pub mod stocks;

/// Services shared by every handler through `AppState`
#[derive(Clone)]
pub struct AppServices {
    pub sales_orders: Arc<SalesOrderService>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub sales_fulfillment: Arc<SalesFulfillmentService>,
    pub purchase_receipts: Arc<PurchaseReceiptService>,
    pub stock_movements: Arc<StockMovementService>,
    pub products: Arc<ProductService>,
    pub stocks: Arc<StockService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, config: &AppConfig) -> Self {
        Self::with_clock(db, config, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Arc<DbPool>, config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let limits = PageLimits::from(config);
        Self {
            sales_orders: Arc::new(
                SalesOrderService::new(db.clone(), config.document_prefix.clone(), limits)
                    .with_clock(clock.clone()),
            ),
            purchase_orders: Arc::new(
                PurchaseOrderService::new(db.clone(), config.document_prefix.clone(), limits)
                    .with_clock(clock.clone()),
            ),
            sales_fulfillment: Arc::new(
                SalesFulfillmentService::new(db.clone(), SalesOrderRepository::new())
                    .with_clock(clock.clone()),
            ),
            purchase_receipts: Arc::new(
                PurchaseReceiptService::new(db.clone(), PurchaseOrderRepository::new())
                    .with_clock(clock.clone()),
            ),
            stock_movements: Arc::new(StockMovementService::new(db.clone())),
            products: Arc::new(ProductService::new(db.clone(), limits).with_clock(clock)),
            stocks: Arc::new(StockService::new(db, limits)),
        }
    }
}
