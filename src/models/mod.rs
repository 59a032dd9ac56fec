pub mod document_number;
pub mod fulfillment;
pub mod order_status;
pub mod order_totals;

pub use order_status::{MovementType, OrderKind, OrderStatus};
