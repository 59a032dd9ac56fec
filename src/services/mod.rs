pub mod fulfillment;
pub mod order_common;
pub mod order_store;
pub mod products;
pub mod purchase_orders;
pub mod sales_orders;
pub mod stock_movements;
pub mod stocks;
