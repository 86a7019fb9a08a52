//! JWT token service
//!
//! Access and refresh tokens are HS256 JWTs carrying a `type` claim. Expiry
//! is checked against the injected clock with zero leeway.

use chrono::TimeDelta;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{User, UserRole};
use thiserror::Error;

use crate::utils::time::SharedClock;

/// JWT configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret, at least 32 bytes outside development
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims as they appear on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClaims {
    uid: String,
    #[serde(rename = "type")]
    token_type: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    venue_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
    iat: i64,
    exp: i64,
    iss: String,
    aud: String,
}

/// Verified access token contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub user_id: String,
    pub email: String,
    pub role: UserRole,
    pub venue_id: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Verified refresh token contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub user_id: String,
    /// Reserved for a revocation list
    pub jti: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Wrong token type: expected {expected:?}")]
    WrongType { expected: TokenType },

    #[error("Token generation failed: {0}")]
    Generation(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::token_expired(),
            TokenError::Generation(msg) => AppError::internal(msg),
            _ => AppError::invalid_token("Invalid token"),
        }
    }
}

pub struct TokenService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: SharedClock,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: JwtConfig, clock: SharedClock) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&config.audience]);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        // exp is compared against the injected clock in `verify`
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
            clock,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn issue_token_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user)?,
            refresh_token: self.issue_refresh_token(user)?,
        })
    }

    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        let now = self.clock.utc();
        let exp = now + TimeDelta::minutes(self.config.access_ttl_minutes);
        self.sign(&RawClaims {
            uid: user.id.clone(),
            token_type: TokenType::Access,
            email: Some(user.email.clone()),
            role: Some(user.role),
            venue_id: Some(user.venue_id.clone()),
            jti: None,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        })
    }

    fn issue_refresh_token(&self, user: &User) -> Result<String, TokenError> {
        let now = self.clock.utc();
        let exp = now + TimeDelta::days(self.config.refresh_ttl_days);
        self.sign(&RawClaims {
            uid: user.id.clone(),
            token_type: TokenType::Refresh,
            email: None,
            role: None,
            venue_id: None,
            jti: Some(uuid::Uuid::new_v4().to_string()),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        })
    }

    fn sign(&self, claims: &RawClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims = self.verify(token, TokenType::Access)?;
        match (claims.email, claims.role, claims.venue_id) {
            (Some(email), Some(role), Some(venue_id)) => Ok(AccessClaims {
                user_id: claims.uid,
                email,
                role,
                venue_id,
                issued_at: claims.iat,
                expires_at: claims.exp,
            }),
            _ => Err(TokenError::Invalid("missing access claims".to_string())),
        }
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims = self.verify(token, TokenType::Refresh)?;
        let jti = claims
            .jti
            .ok_or_else(|| TokenError::Invalid("missing jti".to_string()))?;
        Ok(RefreshClaims {
            user_id: claims.uid,
            jti,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    fn verify(&self, token: &str, expected: TokenType) -> Result<RawClaims, TokenError> {
        let data = decode::<RawClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Invalid(e.to_string()),
            },
        )?;
        let claims = data.claims;

        if self.clock.utc().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        if claims.token_type != expected {
            return Err(TokenError::WrongType { expected });
        }
        Ok(claims)
    }

    /// Token part of an `Authorization: Bearer <token>` header
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
