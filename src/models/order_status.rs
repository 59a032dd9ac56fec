use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Lifecycle status shared by sales and purchase orders.
///
/// Stored as its snake_case string so rows stay readable from SQL.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    Partial,
    Approved,
    Delivered,
    Received,
    Rejected,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Draft
    }
}

/// Which side of the business an order belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderKind {
    Sales,
    Purchase,
}

impl OrderKind {
    /// Status an order reaches once every item has been fulfilled
    pub fn completed_status(self) -> OrderStatus {
        match self {
            OrderKind::Sales => OrderStatus::Delivered,
            OrderKind::Purchase => OrderStatus::Received,
        }
    }

    /// Code embedded in document numbers
    pub fn document_code(self) -> &'static str {
        match self {
            OrderKind::Sales => "SO",
            OrderKind::Purchase => "PO",
        }
    }

    pub fn movement_type(self) -> MovementType {
        match self {
            OrderKind::Sales => MovementType::Out,
            OrderKind::Purchase => MovementType::In,
        }
    }
}

/// Direction of a stock movement
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MovementType {
    Out,
    In,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(OrderStatus::Delivered.to_string(), "delivered");
        assert_eq!(OrderStatus::from_str("partial").unwrap(), OrderStatus::Partial);
        assert!(OrderStatus::from_str("shipped").is_err());
    }

    #[test]
    fn kind_maps_to_completed_status_and_movement() {
        assert_eq!(OrderKind::Sales.completed_status(), OrderStatus::Delivered);
        assert_eq!(OrderKind::Purchase.completed_status(), OrderStatus::Received);
        assert_eq!(OrderKind::Sales.movement_type().as_ref(), "out");
        assert_eq!(OrderKind::Purchase.movement_type().as_ref(), "in");
    }
}
