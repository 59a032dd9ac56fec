pub mod product;
pub mod purchase_order;
pub mod purchase_order_item;
pub mod sales_order;
pub mod sales_order_item;
pub mod stock;
pub mod stock_movement;
pub mod stock_movement_detail;
