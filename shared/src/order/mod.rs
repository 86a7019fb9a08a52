//! Order lifecycle types
//!
//! - [`OrderStatus`]: the `new → preparing → ready → served` lifecycle
//! - [`Order`]: the persisted order with its status timestamps
//! - [`OrderTrackingView`]: what a customer sees when tracking an order
//! - request/response DTOs for the order and tracking endpoints

pub mod dto;
pub mod types;

// Re-exports
pub use dto::*;
pub use types::*;
