//! Shared types for the venue ordering platform
//!
//! Wire types used by the venue server and by any client talking to it:
//! error codes and the response envelope, auth DTOs, the staff user model
//! and the order model with its tracking projection.

pub mod client;
pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
