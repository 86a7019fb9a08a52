//! Order status state machine
//!
//! `new → preparing → ready → served`. Moves go forward only and may skip
//! states. Re-entering the current status succeeds without changes.

use shared::order::{Order, OrderStatus};

use super::error::{OrderError, OrderResult};

/// Apply `target` to `order`; returns whether the order changed
///
/// The status timestamp is set only the first time a status is entered.
/// Skipped statuses keep no timestamp.
pub fn apply_status(order: &mut Order, target: OrderStatus, now: i64) -> OrderResult<bool> {
    let current = order.status;
    if target == current {
        return Ok(false);
    }
    if target.rank() < current.rank() {
        return Err(OrderError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    order.status = target;
    let slot = match target {
        OrderStatus::New => None,
        OrderStatus::Preparing => Some(&mut order.prepared_at),
        OrderStatus::Ready => Some(&mut order.ready_at),
        OrderStatus::Served => Some(&mut order.served_at),
    };
    if let Some(slot) = slot
        && slot.is_none()
    {
        *slot = Some(now);
    }
    order.updated_at = now;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn order() -> Order {
        Order {
            id: "o-1".to_string(),
            venue_id: "venue-1".to_string(),
            table_number: "T1".to_string(),
            order_number: "venue-1-0001".to_string(),
            items: Vec::new(),
            total_amount: Decimal::ZERO,
            customer_name: None,
            special_instructions: None,
            status: OrderStatus::New,
            payment_method: None,
            payment_status: None,
            created_at: 100,
            prepared_at: None,
            ready_at: None,
            served_at: None,
            updated_at: 100,
        }
    }

    #[test]
    fn test_forward_moves_set_timestamps() {
        let mut order = order();
        assert!(apply_status(&mut order, OrderStatus::Preparing, 200).unwrap());
        assert!(apply_status(&mut order, OrderStatus::Ready, 300).unwrap());
        assert!(apply_status(&mut order, OrderStatus::Served, 400).unwrap());

        assert_eq!(order.prepared_at, Some(200));
        assert_eq!(order.ready_at, Some(300));
        assert_eq!(order.served_at, Some(400));
        assert_eq!(order.updated_at, 400);
    }

    #[test]
    fn test_reentry_is_noop() {
        let mut order = order();
        apply_status(&mut order, OrderStatus::Ready, 300).unwrap();
        assert!(!apply_status(&mut order, OrderStatus::Ready, 900).unwrap());
        assert_eq!(order.ready_at, Some(300));
        assert_eq!(order.updated_at, 300);
    }

    #[test]
    fn test_backward_rejected_and_order_untouched() {
        let mut order = order();
        apply_status(&mut order, OrderStatus::Served, 400).unwrap();
        let before = order.clone();

        let err = apply_status(&mut order, OrderStatus::Preparing, 500).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Served,
                to: OrderStatus::Preparing
            }
        ));
        assert_eq!(order, before);
        assert!(apply_status(&mut order, OrderStatus::New, 500).is_err());
    }

    #[test]
    fn test_skip_sets_only_target_timestamp() {
        let mut order = order();
        apply_status(&mut order, OrderStatus::Served, 400).unwrap();
        assert_eq!(order.prepared_at, None);
        assert_eq!(order.ready_at, None);
        assert_eq!(order.served_at, Some(400));
    }
}
