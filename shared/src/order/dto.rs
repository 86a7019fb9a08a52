//! Order endpoint request/response types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::OrderStatus;

/// Item as submitted by the customer front-end
///
/// Numbers are kept signed here so non-positive values reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub name_albanian: Option<String>,
    pub price: Decimal,
    pub quantity: i64,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// Create order request (`POST /v1/orders`)
///
/// Any client-supplied total is ignored; the server computes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub venue_id: String,
    pub table_number: String,
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub order_number: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
}

/// Status update request (`PUT /v1/orders/{id}/status`)
///
/// `status` stays a string so unknown values get the order error code
/// rather than a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusResponse {
    pub status: OrderStatus,
    pub updated_at: i64,
}

/// Query string of `GET /v1/orders`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub venue_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_ignores_client_total() {
        let req: CreateOrderRequest = serde_json::from_str(
            r#"{
                "venueId": "venue-1",
                "tableNumber": "T5",
                "totalAmount": 999,
                "items": [
                    {"id": "a", "name": "Espresso", "price": 3.5, "quantity": 2},
                    {"id": "b", "name": "Burek", "price": 8, "quantity": 1}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(req.items.len(), 2);
        assert_eq!(req.items[0].price, Decimal::new(35, 1));
        assert_eq!(req.items[1].price, Decimal::from(8));
        assert!(req.customer_name.is_none());
    }

    #[test]
    fn test_negative_quantity_still_deserializes() {
        let item: OrderItemInput =
            serde_json::from_str(r#"{"id":"a","name":"x","price":1,"quantity":-2}"#).unwrap();
        assert_eq!(item.quantity, -2);
    }

    #[test]
    fn test_create_response_shape() {
        let json = serde_json::to_value(CreateOrderResponse {
            order_id: "id-1".to_string(),
            order_number: "venue-1-0001".to_string(),
            total_amount: Decimal::from(15),
            status: OrderStatus::New,
        })
        .unwrap();
        assert_eq!(json["orderNumber"], "venue-1-0001");
        assert_eq!(json["totalAmount"].as_f64(), Some(15.0));
        assert_eq!(json["status"], "new");
    }
}
