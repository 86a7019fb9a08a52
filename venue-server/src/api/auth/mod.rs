//! Authentication routes

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

/// - /v1/auth/login, /v1/auth/refresh: public
/// - /v1/auth/me, /v1/auth/logout: bearer access token
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/v1/auth/login", post(handler::login))
        .route("/v1/auth/refresh", post(handler::refresh))
        .route("/v1/auth/logout", post(handler::logout))
        .route("/v1/auth/me", get(handler::me))
}
