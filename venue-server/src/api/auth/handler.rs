//! Authentication handlers

use axum::{Json, extract::State};
use shared::client::{
    CurrentUserResponse, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse,
};
use shared::error::AppError;

use crate::api::extract::JsonBody;
use crate::audit::ClientOrigin;
use crate::auth::CurrentUser;
use crate::core::ServerState;

/// Exchange email and password for an access/refresh token pair
///
/// Wrong password, unknown email, inactive account and locked account all
/// produce the same response.
pub async fn login(
    State(state): State<ServerState>,
    origin: ClientOrigin,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let result = state.auth().login(&req.email, &req.password, &origin).await?;

    Ok(Json(LoginResponse {
        token: result.tokens.access_token,
        refresh_token: result.tokens.refresh_token,
        user: result.user,
    }))
}

pub async fn refresh(
    State(state): State<ServerState>,
    origin: ClientOrigin,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let token = state.auth().refresh(&req.refresh_token, &origin)?;
    Ok(Json(RefreshResponse { token }))
}

pub async fn logout(
    State(state): State<ServerState>,
    user: CurrentUser,
    origin: ClientOrigin,
) -> Json<serde_json::Value> {
    state.auth().logout(&user, &origin);
    Json(serde_json::json!({}))
}

pub async fn me(user: CurrentUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        id: user.id,
        email: user.email,
        role: user.role.to_string(),
        venue_id: user.venue_id,
    })
}
