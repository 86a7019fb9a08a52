//! Public order tracking
//!
//! Looked up by order number only; the response carries no customer or
//! venue-internal data.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use shared::error::AppError;
use shared::order::OrderTrackingView;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/v1/track/{order_number}", get(track_order))
}

async fn track_order(
    State(state): State<ServerState>,
    Path(order_number): Path<String>,
) -> Result<Json<OrderTrackingView>, AppError> {
    Ok(Json(state.orders().track_order(&order_number)?))
}
