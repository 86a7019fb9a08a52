//! Bearer-token extractor for staff routes

use axum::extract::FromRequestParts;
use http::request::Parts;
use shared::error::AppError;
use shared::models::UserRole;

use super::jwt::{AccessClaims, TokenService};
use crate::core::ServerState;
use crate::security_log;

/// Authenticated staff member, taken from a verified access token
///
/// ```ignore
/// async fn handler(user: CurrentUser) -> Json<()> {
///     tracing::info!(venue = %user.venue_id, "acting on own venue");
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub venue_id: String,
}

impl From<AccessClaims> for CurrentUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.user_id,
            email: claims.email,
            role: claims.role,
            venue_id: claims.venue_id,
        }
    }
}

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => TokenService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => {
                security_log!("WARN", "auth_missing", uri = parts.uri.path());
                return Err(AppError::not_authenticated());
            }
        };

        match state.tokens().verify_access(token) {
            Ok(claims) => {
                let user = CurrentUser::from(claims);
                parts.extensions.insert(user.clone());
                Ok(user)
            }
            Err(e) => {
                security_log!(
                    "WARN",
                    "auth_failed",
                    error = e.to_string(),
                    uri = parts.uri.path()
                );
                Err(e.into())
            }
        }
    }
}
