//! Order, order item and status types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Status
// ============================================================================

/// Order status
///
/// Statuses are totally ordered by [`OrderStatus::rank`]. `New` is the only
/// initial status, `Served` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    New,
    Preparing,
    Ready,
    Served,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [Self::New, Self::Preparing, Self::Ready, Self::Served];

    /// Position in the lifecycle, `New` = 0
    pub const fn rank(&self) -> u8 {
        match self {
            Self::New => 0,
            Self::Preparing => 1,
            Self::Ready => 2,
            Self::Served => 3,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Served)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Served => "served",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status string that names no lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOrderStatus(pub String);

impl fmt::Display for UnknownOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown order status: {:?}", self.0)
    }
}

impl std::error::Error for UnknownOrderStatus {}

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "served" => Ok(Self::Served),
            _ => Err(UnknownOrderStatus(s.to_string())),
        }
    }
}

// ============================================================================
// Items
// ============================================================================

/// Line item, copied from the menu at order time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Menu item ID
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_albanian: Option<String>,
    /// Unit price
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

impl OrderItem {
    /// price × quantity
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

// ============================================================================
// Order
// ============================================================================

/// A customer order
///
/// All timestamps are Unix millis. `prepared_at`, `ready_at` and `served_at`
/// are set once, the first time the order enters the matching status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub venue_id: String,
    pub table_number: String,
    /// `{venueId}-{seq:04}`, unique across venues
    pub order_number: String,
    pub items: Vec<OrderItem>,
    /// Server-computed Σ price × quantity
    pub total_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub status: OrderStatus,
    /// Written by the payment collaborator, never by the order core
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    pub created_at: i64,
    #[serde(default)]
    pub prepared_at: Option<i64>,
    #[serde(default)]
    pub ready_at: Option<i64>,
    #[serde(default)]
    pub served_at: Option<i64>,
    pub updated_at: i64,
}

impl Order {
    /// Timestamp recorded when the order entered `status`
    pub fn entered_at(&self, status: OrderStatus) -> Option<i64> {
        match status {
            OrderStatus::New => Some(self.created_at),
            OrderStatus::Preparing => self.prepared_at,
            OrderStatus::Ready => self.ready_at,
            OrderStatus::Served => self.served_at,
        }
    }

    /// Customer-facing projection
    pub fn tracking_view(&self) -> OrderTrackingView {
        OrderTrackingView {
            order_number: self.order_number.clone(),
            table_number: self.table_number.clone(),
            status: self.status,
            items: self
                .items
                .iter()
                .map(|item| TrackedItem {
                    name: item.name.clone(),
                    name_albanian: item.name_albanian.clone(),
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            total_amount: self.total_amount,
            created_at: self.created_at,
            prepared_at: self.prepared_at,
            ready_at: self.ready_at,
            served_at: self.served_at,
        }
    }
}

/// Item as shown on the tracking page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_albanian: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
}

/// Public tracking projection: no customer name, no internal ids
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderTrackingView {
    pub order_number: String,
    pub table_number: String,
    pub status: OrderStatus,
    pub items: Vec<TrackedItem>,
    pub total_amount: Decimal,
    pub created_at: i64,
    pub prepared_at: Option<i64>,
    pub ready_at: Option<i64>,
    pub served_at: Option<i64>,
}
