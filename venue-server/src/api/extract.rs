//! Extractors shared by handlers

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::Json;
use http::request::Parts;
use serde::de::DeserializeOwned;
use shared::error::AppError;

use crate::audit::ClientOrigin;
use crate::core::ServerState;
use crate::middleware::client_ip;

/// `Json<T>` whose rejections use the error envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::validation(rejection.body_text())),
        }
    }
}

impl FromRequestParts<ServerState> for ClientOrigin {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let trust_forwarded_for = state.rate_limiter().config().trust_forwarded_for;
        let user_agent = parts
            .headers
            .get(http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| ua.chars().take(256).collect());

        Ok(ClientOrigin {
            ip: Some(client_ip(&parts.headers, &parts.extensions, trust_forwarded_for)),
            user_agent,
        })
    }
}
