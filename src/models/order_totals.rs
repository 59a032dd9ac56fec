use rust_decimal::Decimal;
use serde::Serialize;

/// Monetary breakdown of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Line subtotal: quantity times unit price
pub fn line_subtotal(quantity: i32, price: Decimal) -> Decimal {
    Decimal::from(quantity) * price
}

/// Applies the percentage discount first, then tax on the discounted amount.
pub fn compute_totals<I>(lines: I, discount_percent: Decimal, tax_percent: Decimal) -> OrderTotals
where
    I: IntoIterator<Item = (i32, Decimal)>,
{
    let hundred = Decimal::ONE_HUNDRED;
    let subtotal: Decimal = lines
        .into_iter()
        .map(|(quantity, price)| line_subtotal(quantity, price))
        .sum();
    let discount = subtotal * discount_percent / hundred;
    let after_discount = subtotal - discount;
    let tax = after_discount * tax_percent / hundred;

    OrderTotals {
        subtotal,
        discount,
        tax,
        total: after_discount + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn discount_then_tax() {
        let totals = compute_totals(
            vec![(2, dec!(100)), (1, dec!(50))],
            dec!(10),
            dec!(11),
        );
        assert_eq!(totals.subtotal, dec!(250));
        assert_eq!(totals.discount, dec!(25));
        assert_eq!(totals.tax, dec!(24.75));
        assert_eq!(totals.total, dec!(249.75));
    }

    #[test]
    fn no_lines_means_zero_total() {
        let totals = compute_totals(Vec::new(), dec!(5), dec!(11));
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn line_subtotal_multiplies() {
        assert_eq!(line_subtotal(3, dec!(19.99)), dec!(59.97));
    }
}
