use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::models::OrderStatus;

/// Line item payload shared by sales and purchase orders
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderItemInput {
    pub product_id: i32,
    pub warehouse_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom = "validate_non_negative")]
    pub price: Decimal,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    pub status_partial: bool,
    /// Delivered or received quantity so far
    #[serde(default, alias = "delivered_qty", alias = "received_qty")]
    #[validate(range(min = 0))]
    pub fulfilled_qty: i32,
}

pub(crate) fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

pub(crate) fn validate_percent(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("percent_out_of_range"));
    }
    Ok(())
}

/// Checks the item list beyond what field-level validation covers
pub(crate) fn validate_items(items: &[OrderItemInput]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "Items must not be empty".to_string(),
        ));
    }
    for (idx, item) in items.iter().enumerate() {
        item.validate()?;
        if item.fulfilled_qty > item.quantity {
            return Err(ServiceError::ValidationError(format!(
                "Item {}: fulfilled quantity ({}) exceeds ordered quantity ({})",
                idx + 1,
                item.fulfilled_qty,
                item.quantity
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(ServiceError::ValidationError(format!(
                "Invalid sort order '{}'; expected asc or desc",
                other
            ))),
        }
    }
}

/// Page size bounds taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_per_page: u64,
    pub max_per_page: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_per_page: 10,
            max_per_page: 100,
        }
    }
}

impl From<&AppConfig> for PageLimits {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            default_per_page: cfg.default_page_size,
            max_per_page: cfg.max_page_size,
        }
    }
}

impl PageLimits {
    /// Resolves `(page, per_page)`; pages are 1-based and sizes are capped.
    pub fn resolve(
        &self,
        page: Option<u64>,
        per_page: Option<u64>,
    ) -> Result<(u64, u64), ServiceError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "page must be at least 1".to_string(),
            ));
        }
        let per_page = per_page
            .unwrap_or(self.default_per_page)
            .clamp(1, self.max_per_page);
        Ok((page, per_page))
    }
}

/// Status filter from a query string
pub(crate) fn parse_status_filter(value: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(value)
        .map_err(|_| ServiceError::InvalidStatus(format!("Unknown order status '{}'", value)))
}

/// Lower-cased `%term%` pattern, or `None` for a blank search
pub(crate) fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn item(quantity: i32, fulfilled_qty: i32) -> OrderItemInput {
        OrderItemInput {
            product_id: 1,
            warehouse_id: 1,
            quantity,
            price: dec!(10),
            description: None,
            status_partial: false,
            fulfilled_qty,
        }
    }

    #[test]
    fn empty_items_rejected() {
        assert_matches!(validate_items(&[]), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn zero_quantity_rejected() {
        assert_matches!(
            validate_items(&[item(0, 0)]),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn fulfilled_above_ordered_rejected() {
        assert_matches!(
            validate_items(&[item(2, 3)]),
            Err(ServiceError::ValidationError(_))
        );
        assert!(validate_items(&[item(2, 2)]).is_ok());
    }

    #[test]
    fn negative_price_rejected() {
        let mut bad = item(1, 0);
        bad.price = dec!(-1);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn item_accepts_side_specific_quantity_names() {
        let parsed: OrderItemInput = serde_json::from_str(
            r#"{"product_id":1,"warehouse_id":2,"quantity":5,"price":"1.50","received_qty":2}"#,
        )
        .unwrap();
        assert_eq!(parsed.fulfilled_qty, 2);
    }

    #[test]
    fn page_limits_cap_and_default() {
        let limits = PageLimits::default();
        assert_eq!(limits.resolve(None, None).unwrap(), (1, 10));
        assert_eq!(limits.resolve(Some(3), Some(500)).unwrap(), (3, 100));
        assert!(limits.resolve(Some(0), None).is_err());
    }

    #[test]
    fn sort_direction_parsing() {
        assert_eq!("ASC".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert!("sideways".parse::<SortDirection>().is_err());
    }

    #[test]
    fn search_pattern_ignores_blank_terms() {
        assert_eq!(search_pattern(Some("  ")), None);
        assert_eq!(search_pattern(Some("ApU")), Some("%apu%".to_string()));
    }

    #[test]
    fn status_filter_rejects_unknown_values() {
        assert_matches!(parse_status_filter("shipped"), Err(ServiceError::InvalidStatus(_)));
        assert_eq!(parse_status_filter("draft").unwrap(), OrderStatus::Draft);
    }
}
