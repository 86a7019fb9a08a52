//! Order routes
//!
//! Creating an order is public (customer at the table). Everything else
//! needs a staff access token and stays within the staff member's venue.

mod handler;

use axum::{Router, routing::get, routing::put};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/v1/orders",
            get(handler::list_orders).post(handler::create_order),
        )
        .route("/v1/orders/{id}", get(handler::get_order))
        .route("/v1/orders/{id}/status", put(handler::update_status))
}
