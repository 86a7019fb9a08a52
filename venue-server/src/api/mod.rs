//! HTTP API
//!
//! # Routes
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /v1/auth/login | POST | public |
//! | /v1/auth/refresh | POST | public |
//! | /v1/auth/logout | POST | bearer |
//! | /v1/auth/me | GET | bearer |
//! | /v1/orders | POST | public |
//! | /v1/orders | GET | bearer |
//! | /v1/orders/{id} | GET | bearer |
//! | /v1/orders/{id}/status | PUT | bearer |
//! | /v1/track/{orderNumber} | GET | public |
//! | /health | GET | public |

pub mod auth;
pub mod extract;
pub mod health;
pub mod orders;
pub mod track;

use axum::Router;
use axum::middleware as axum_middleware;
use http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;
use crate::middleware;

/// All routes, no middleware
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(auth::router())
        .merge(orders::router())
        .merge(track::router())
        .merge(health::router())
}

/// Fully layered application, used by the server and by tests
pub fn build_app(state: ServerState) -> Router {
    let timeout = state.config.request_timeout;

    build_router()
        // Innermost: runs right before the handler
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ))
        .layer(axum_middleware::from_fn(middleware::sanitize_json_body))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(CorsLayer::permissive())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        // Outermost: request id is set before logging reads it
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
