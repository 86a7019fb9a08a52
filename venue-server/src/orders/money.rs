//! Item validation and totals, in `Decimal`

use rust_decimal::prelude::*;
use shared::order::{OrderItem, OrderItemInput};

use super::error::{OrderError, OrderResult};
use crate::utils::validation::{
    MAX_ID_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};

/// Prices are whole cents
const PRICE_DECIMAL_PLACES: u32 = 2;

/// Maximum price per item (1,000,000)
const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Maximum quantity per item
const MAX_QUANTITY: i64 = 9999;
/// Maximum number of lines per order
pub const MAX_ITEMS: usize = 100;

fn invalid(msg: String) -> OrderError {
    OrderError::Validation(msg)
}

/// Validate one submitted line and turn it into a stored item
pub fn validate_item(index: usize, item: &OrderItemInput) -> OrderResult<OrderItem> {
    let field = |name: &str| format!("items[{index}].{name}");

    validate_required_text(&item.id, &field("id"), MAX_ID_LEN).map_err(invalid)?;
    validate_required_text(&item.name, &field("name"), MAX_NAME_LEN).map_err(invalid)?;
    validate_optional_text(&item.name_albanian, &field("nameAlbanian"), MAX_NAME_LEN)
        .map_err(invalid)?;
    validate_optional_text(
        &item.special_instructions,
        &field("specialInstructions"),
        MAX_NOTE_LEN,
    )
    .map_err(invalid)?;

    if item.price <= Decimal::ZERO {
        return Err(invalid(format!(
            "{} must be positive, got {}",
            field("price"),
            item.price
        )));
    }
    if item.price.normalize().scale() > PRICE_DECIMAL_PLACES {
        return Err(invalid(format!(
            "{} must have at most {PRICE_DECIMAL_PLACES} decimal places, got {}",
            field("price"),
            item.price
        )));
    }
    if item.price > MAX_PRICE {
        return Err(invalid(format!(
            "{} exceeds maximum allowed ({MAX_PRICE}), got {}",
            field("price"),
            item.price
        )));
    }

    if item.quantity <= 0 {
        return Err(invalid(format!(
            "{} must be positive, got {}",
            field("quantity"),
            item.quantity
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(invalid(format!(
            "{} exceeds maximum allowed ({MAX_QUANTITY}), got {}",
            field("quantity"),
            item.quantity
        )));
    }

    Ok(OrderItem {
        id: item.id.trim().to_string(),
        name: item.name.trim().to_string(),
        name_albanian: non_empty(&item.name_albanian),
        price: item.price,
        // Bounded by MAX_QUANTITY above
        quantity: item.quantity as u32,
        special_instructions: non_empty(&item.special_instructions),
    })
}

/// Validate every line of an order
pub fn validate_items(items: &[OrderItemInput]) -> OrderResult<Vec<OrderItem>> {
    if items.is_empty() {
        return Err(OrderError::Empty);
    }
    if items.len() > MAX_ITEMS {
        return Err(invalid(format!(
            "too many items ({}, max {MAX_ITEMS})",
            items.len()
        )));
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_item(index, item))
        .collect()
}

/// Σ price × quantity; exact, prices carry at most two decimal places
pub fn order_total(items: &[OrderItem]) -> Decimal {
    items.iter().map(OrderItem::line_total).sum()
}

/// Blank optional text counts as absent
pub fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(price: Decimal, quantity: i64) -> OrderItemInput {
        OrderItemInput {
            id: "espresso".to_string(),
            name: "Espresso".to_string(),
            name_albanian: Some("  ".to_string()),
            price,
            quantity,
            special_instructions: None,
        }
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let items = validate_items(&[
            input(Decimal::new(35, 1), 2),
            input(Decimal::from(8), 1),
        ])
        .unwrap();
        assert_eq!(order_total(&items), Decimal::from(15));
    }

    #[test]
    fn test_sub_cent_prices_rejected() {
        let err = validate_items(&[input(Decimal::new(3335, 3), 1)]).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert!(err.to_string().contains("items[0].price"));

        // Trailing zeros are not extra precision
        let items = validate_items(&[input(Decimal::new(3500, 3), 3)]).unwrap();
        assert_eq!(order_total(&items), Decimal::new(105, 1));
    }

    #[test]
    fn test_total_equals_sum_of_line_totals() {
        let items = validate_items(&[
            input(Decimal::new(199, 2), 3),
            input(Decimal::new(1, 2), 7),
            input(Decimal::new(1050, 2), 1),
        ])
        .unwrap();
        let lines: Decimal = items.iter().map(OrderItem::line_total).sum();
        assert_eq!(order_total(&items), lines);
        assert_eq!(order_total(&items), Decimal::new(1654, 2));
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert!(matches!(validate_items(&[]), Err(OrderError::Empty)));
        assert!(validate_items(&[input(Decimal::ZERO, 1)]).is_err());
        assert!(validate_items(&[input(Decimal::new(-1, 0), 1)]).is_err());
        assert!(validate_items(&[input(Decimal::ONE, 0)]).is_err());
        assert!(validate_items(&[input(Decimal::ONE, -3)]).is_err());
        assert!(validate_items(&[input(Decimal::ONE, 10_000)]).is_err());
        assert!(validate_items(&[input(Decimal::from(1_000_001), 1)]).is_err());

        let many: Vec<_> = (0..=MAX_ITEMS).map(|_| input(Decimal::ONE, 1)).collect();
        assert!(validate_items(&many).is_err());
    }

    #[test]
    fn test_error_names_the_line() {
        let err = validate_items(&[input(Decimal::ONE, 1), input(Decimal::ONE, 0)]).unwrap_err();
        assert!(err.to_string().contains("items[1].quantity"));
    }

    #[test]
    fn test_blank_optional_text_dropped() {
        let item = validate_item(0, &input(Decimal::ONE, 1)).unwrap();
        assert_eq!(item.name_albanian, None);
    }
}
