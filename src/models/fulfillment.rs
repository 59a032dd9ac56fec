use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::order_status::{OrderKind, OrderStatus};

/// Line item as seen by the reconciler, independent of sales or purchase tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FulfillmentLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: i32,
    pub warehouse_id: i32,
    /// Ordered quantity
    pub quantity: i32,
    /// Delivered (sales) or received (purchase) quantity
    pub fulfilled_qty: i32,
    pub status_partial: bool,
    pub description: Option<String>,
}

impl FulfillmentLine {
    /// Quantity to book on a stock movement; falls back to the ordered quantity
    /// when nothing has been recorded yet.
    pub fn movement_quantity(&self) -> i32 {
        if self.fulfilled_qty > 0 {
            self.fulfilled_qty
        } else {
            self.quantity
        }
    }
}

/// Order header fields the reconciler reads and writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FulfillmentOrder {
    pub id: Uuid,
    pub kind: OrderKind,
    pub document_no: String,
    pub status: OrderStatus,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub fulfilled_by: Option<Uuid>,
    pub items: Vec<FulfillmentLine>,
}

/// What a reconciliation pass changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub previous: OrderStatus,
    pub status: OrderStatus,
    /// Completion was (re)confirmed: timestamp stamped and lines force-synced
    pub closed_out: bool,
    pub synced_lines: Vec<Uuid>,
}

impl ReconcileOutcome {
    pub fn status_changed(&self) -> bool {
        self.previous != self.status
    }
}

/// Order status implied by the partial flags of its lines.
///
/// A single-line order counts as complete as soon as it is touched.
pub fn derive_status(lines: &[FulfillmentLine], kind: OrderKind) -> OrderStatus {
    if lines.len() == 1 {
        return kind.completed_status();
    }

    let any_partial = lines.iter().any(|l| l.status_partial);
    let all_partial = !lines.is_empty() && lines.iter().all(|l| l.status_partial);

    if all_partial {
        kind.completed_status()
    } else if any_partial {
        OrderStatus::Partial
    } else {
        OrderStatus::Draft
    }
}

/// Recomputes `order.status` from `order.items` and closes the order out when
/// every line is done.
pub fn apply_fulfillment(
    order: &mut FulfillmentOrder,
    actor: Option<Uuid>,
    now: DateTime<Utc>,
) -> ReconcileOutcome {
    let previous = order.status;
    let status = derive_status(&order.items, order.kind);
    order.status = status;

    let all_done = !order.items.is_empty() && order.items.iter().all(|l| l.status_partial);
    let closed_out = status == order.kind.completed_status() && all_done;

    let mut synced_lines = Vec::new();
    if closed_out {
        order.fulfilled_at = Some(now);
        if actor.is_some() {
            order.fulfilled_by = actor;
        }

        for line in order.items.iter_mut() {
            if line.fulfilled_qty != line.quantity || !line.status_partial {
                line.fulfilled_qty = line.quantity;
                line.status_partial = true;
                synced_lines.push(line.id);
            }
        }
    }

    ReconcileOutcome {
        previous,
        status,
        closed_out,
        synced_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;

    fn line(quantity: i32, fulfilled_qty: i32, status_partial: bool) -> FulfillmentLine {
        FulfillmentLine {
            id: Uuid::new_v4(),
            order_id: Uuid::nil(),
            product_id: 1,
            warehouse_id: 1,
            quantity,
            fulfilled_qty,
            status_partial,
            description: None,
        }
    }

    fn order(kind: OrderKind, status: OrderStatus, items: Vec<FulfillmentLine>) -> FulfillmentOrder {
        FulfillmentOrder {
            id: Uuid::nil(),
            kind,
            document_no: "0001/APU/SO/I/2024".into(),
            status,
            fulfilled_at: None,
            fulfilled_by: None,
            items,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).unwrap()
    }

    #[rstest]
    #[case(vec![false, false], OrderStatus::Draft)]
    #[case(vec![true, false], OrderStatus::Partial)]
    #[case(vec![false, true, false], OrderStatus::Partial)]
    #[case(vec![true, true], OrderStatus::Delivered)]
    #[case(vec![false], OrderStatus::Delivered)]
    #[case(vec![true], OrderStatus::Delivered)]
    fn sales_status_from_flags(#[case] flags: Vec<bool>, #[case] expected: OrderStatus) {
        let lines: Vec<_> = flags.into_iter().map(|f| line(5, 0, f)).collect();
        assert_eq!(derive_status(&lines, OrderKind::Sales), expected);
    }

    #[test]
    fn purchase_side_completes_as_received() {
        let lines = vec![line(1, 1, true), line(2, 2, true)];
        assert_eq!(derive_status(&lines, OrderKind::Purchase), OrderStatus::Received);
    }

    #[test]
    fn closing_out_syncs_every_line() {
        let mut o = order(
            OrderKind::Sales,
            OrderStatus::Partial,
            vec![line(5, 5, true), line(3, 1, true)],
        );
        let actor = Uuid::new_v4();
        let outcome = apply_fulfillment(&mut o, Some(actor), now());

        assert!(outcome.closed_out);
        assert!(outcome.status_changed());
        assert_eq!(o.status, OrderStatus::Delivered);
        assert_eq!(o.fulfilled_at, Some(now()));
        assert_eq!(o.fulfilled_by, Some(actor));
        assert_eq!(outcome.synced_lines, vec![o.items[1].id]);
        assert!(o.items.iter().all(|l| l.fulfilled_qty == l.quantity));
    }

    #[test]
    fn unchecked_single_line_completes_without_close_out() {
        let mut o = order(OrderKind::Sales, OrderStatus::Draft, vec![line(4, 0, false)]);
        let outcome = apply_fulfillment(&mut o, None, now());

        assert_eq!(o.status, OrderStatus::Delivered);
        assert!(!outcome.closed_out);
        assert_eq!(o.fulfilled_at, None);
        assert_eq!(o.items[0].fulfilled_qty, 0);
    }

    #[test]
    fn reconfirming_completed_order_refreshes_timestamp() {
        let earlier = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        let mut o = order(
            OrderKind::Purchase,
            OrderStatus::Received,
            vec![line(2, 2, true), line(3, 3, true)],
        );
        o.fulfilled_at = Some(earlier);
        let outcome = apply_fulfillment(&mut o, None, now());

        assert!(!outcome.status_changed());
        assert!(outcome.closed_out);
        assert!(outcome.synced_lines.is_empty());
        assert_eq!(o.fulfilled_at, Some(now()));
    }

    #[test]
    fn missing_actor_keeps_previous_fulfiller() {
        let previous = Uuid::new_v4();
        let mut o = order(
            OrderKind::Sales,
            OrderStatus::Delivered,
            vec![line(1, 1, true), line(1, 1, true)],
        );
        o.fulfilled_by = Some(previous);
        apply_fulfillment(&mut o, None, now());
        assert_eq!(o.fulfilled_by, Some(previous));
    }

    #[test]
    fn movement_quantity_falls_back_to_ordered() {
        assert_eq!(line(7, 0, true).movement_quantity(), 7);
        assert_eq!(line(7, 3, true).movement_quantity(), 3);
    }

    proptest! {
        #[test]
        fn multi_line_status_tracks_flags(flags in prop::collection::vec(any::<bool>(), 2..12)) {
            let lines: Vec<_> = flags.iter().map(|&f| line(3, 0, f)).collect();
            let status = derive_status(&lines, OrderKind::Sales);
            let expected = if flags.iter().all(|&f| f) {
                OrderStatus::Delivered
            } else if flags.iter().any(|&f| f) {
                OrderStatus::Partial
            } else {
                OrderStatus::Draft
            };
            prop_assert_eq!(status, expected);
        }

        #[test]
        fn single_line_always_completes(flag in any::<bool>(), qty in 1i32..1000) {
            let lines = vec![line(qty, 0, flag)];
            prop_assert_eq!(derive_status(&lines, OrderKind::Purchase), OrderStatus::Received);
        }

        #[test]
        fn apply_is_idempotent(flags in prop::collection::vec(any::<bool>(), 1..8)) {
            let items: Vec<_> = flags.iter().map(|&f| line(4, if f { 2 } else { 0 }, f)).collect();
            let mut once = order(OrderKind::Sales, OrderStatus::Draft, items);
            apply_fulfillment(&mut once, None, now());
            let mut twice = once.clone();
            apply_fulfillment(&mut twice, None, now());
            prop_assert_eq!(once, twice);
        }
    }
}
