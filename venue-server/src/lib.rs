//! Venue Server - table-ordering backend core
//!
//! # Overview
//!
//! - **Auth** (`auth`): argon2id passwords, access/refresh JWTs, account lockout
//! - **Orders** (`orders`): order creation and the `new → preparing → ready → served` lifecycle
//! - **Audit** (`audit`): hash-chained security log, written off the request path
//! - **Middleware** (`middleware`): JSON sanitizer, rate limiter, request logging
//! - **Storage** (`db`): embedded redb database
//! - **HTTP API** (`api`): axum routes
//!
//! # Layout
//!
//! ```text
//! venue-server/src/
//! ├── core/          # config, state, errors, server
//! ├── auth/          # tokens, passwords, lockout, login
//! ├── orders/        # order service and state machine
//! ├── audit/         # audit log
//! ├── middleware/    # tower/axum middleware
//! ├── api/           # routes and handlers
//! ├── db/            # redb tables and repositories
//! └── utils/         # logging, clocks, validation
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod middleware;
pub mod orders;
pub mod utils;

pub use api::build_app;
pub use auth::{AuthService, CurrentUser, TokenService};
pub use core::{Config, Server, ServerError, ServerState};
pub use orders::OrderService;
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use utils::logger::init_logger;

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
