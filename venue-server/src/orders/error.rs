//! Order errors

use shared::error::{AppError, ErrorCode};
use shared::order::OrderStatus;
use thiserror::Error;

use crate::db::StorageError;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order has no items")]
    Empty,

    #[error("Order not found: {0}")]
    NotFound(String),

    /// Actor belongs to another venue
    #[error("Order belongs to another venue")]
    Forbidden,

    #[error("Unknown order status: {0:?}")]
    UnknownStatus(String),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::Empty => AppError::new(ErrorCode::OrderEmpty),
            OrderError::NotFound(id) => {
                AppError::new(ErrorCode::OrderNotFound).with_detail("order", id)
            }
            OrderError::Forbidden => AppError::venue_access_denied(),
            OrderError::UnknownStatus(status) => {
                AppError::new(ErrorCode::InvalidOrderStatus).with_detail("status", status)
            }
            OrderError::InvalidTransition { from, to } => {
                AppError::new(ErrorCode::InvalidStatusTransition)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            OrderError::Storage(e) => e.into(),
        }
    }
}
