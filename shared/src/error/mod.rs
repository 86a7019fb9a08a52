//! Unified error system for the venue platform
//!
//! - [`ErrorCode`]: numeric error codes shared with the front-ends
//! - [`ErrorCategory`]: classification of codes by range
//! - [`AppError`]: error with code, message and optional details
//! - [`ApiResponse`]: the JSON envelope every error is rendered as
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::with_message(ErrorCode::ValidationFailed, "tableNumber is required")
//!     .with_detail("field", "tableNumber");
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(2));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
