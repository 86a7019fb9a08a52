//! Order handlers

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use shared::error::AppError;
use shared::order::{
    CreateOrderRequest, CreateOrderResponse, ListOrdersQuery, Order, UpdateStatusRequest,
    UpdateStatusResponse,
};

use crate::api::extract::JsonBody;
use crate::audit::ClientOrigin;
use crate::auth::CurrentUser;
use crate::core::ServerState;

pub async fn create_order(
    State(state): State<ServerState>,
    origin: ClientOrigin,
    JsonBody(req): JsonBody<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    let order = state.orders().create_order(req, &origin)?;

    Ok(Json(CreateOrderResponse {
        order_id: order.id,
        order_number: order.order_number,
        total_amount: order.total_amount,
        status: order.status,
    }))
}

pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    origin: ClientOrigin,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, AppError> {
    let order = state
        .orders()
        .update_status(&id, &req.status, &user, &origin)?;

    Ok(Json(UpdateStatusResponse {
        status: order.status,
        updated_at: order.updated_at,
    }))
}

pub async fn list_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
    origin: ClientOrigin,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<Vec<Order>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::validation(e.body_text()))?;
    let orders = state.orders().list_orders(&query, &user, &origin)?;
    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<ServerState>,
    user: CurrentUser,
    origin: ClientOrigin,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.orders().get_order(&id, &user, &origin)?))
}
