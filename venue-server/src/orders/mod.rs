//! Order lifecycle
//!
//! Orders are created by customers (public) and moved through
//! `new → preparing → ready → served` by staff of the owning venue.

mod error;
mod lifecycle;
mod money;
mod service;

pub use error::{OrderError, OrderResult};
pub use lifecycle::apply_status;
pub use money::{MAX_ITEMS, order_total, validate_items};
pub use service::OrderService;
