//! Login, refresh and logout orchestration

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use shared::error::AppError;
use shared::models::{User, UserInfo, UserRole, normalize_email};
use thiserror::Error;

use super::extractor::CurrentUser;
use super::jwt::{TokenError, TokenPair, TokenService};
use super::lockout::LockoutGuard;
use super::password::CredentialHasher;
use crate::audit::{AuditAction, AuditService, ClientOrigin};
use crate::db::StorageError;
use crate::db::repository::UserRepository;
use crate::security_log;
use crate::utils::time::{SharedClock, now_millis};
use crate::utils::validation::{
    MAX_ID_LEN, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, validate_email,
    validate_required_text,
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account locked")]
    AccountLocked,

    #[error(transparent)]
    InvalidToken(#[from] TokenError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            // Indistinguishable to the client
            AuthError::InvalidCredentials | AuthError::AccountLocked => {
                AppError::authentication_failed()
            }
            AuthError::InvalidToken(e) => e.into(),
            AuthError::Storage(e) => e.into(),
            AuthError::Internal(msg) => AppError::internal(msg),
        }
    }
}

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub tokens: TokenPair,
    pub user: UserInfo,
}

pub struct AuthService {
    users: UserRepository,
    lockout: LockoutGuard,
    tokens: Arc<TokenService>,
    hasher: CredentialHasher,
    audit: Arc<AuditService>,
    clock: SharedClock,
    fixed_delay: Duration,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("fixed_delay", &self.fixed_delay)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        users: UserRepository,
        lockout: LockoutGuard,
        tokens: Arc<TokenService>,
        hasher: CredentialHasher,
        audit: Arc<AuditService>,
        clock: SharedClock,
        fixed_delay: Duration,
    ) -> Self {
        Self {
            users,
            lockout,
            tokens,
            hasher,
            audit,
            clock,
            fixed_delay,
        }
    }

    /// Authenticate with email and password
    ///
    /// Every outcome waits the configured fixed delay before returning.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        origin: &ClientOrigin,
    ) -> Result<LoginResult, AuthError> {
        let result = self.authenticate(email, password, origin);
        if !self.fixed_delay.is_zero() {
            tokio::time::sleep(self.fixed_delay).await;
        }
        result
    }

    fn authenticate(
        &self,
        email: &str,
        password: &str,
        origin: &ClientOrigin,
    ) -> Result<LoginResult, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        // Checked before any hashing; the counter is left alone
        if self.lockout.is_locked(&email)? {
            security_log!("WARN", "login_blocked", email = email.as_str());
            self.audit.log(
                AuditAction::LoginBlocked,
                None,
                origin,
                json!({ "email": email }),
            );
            return Err(AuthError::AccountLocked);
        }

        let Some(user) = self.users.find_by_email(&email)? else {
            self.hasher.verify_dummy(password);
            self.fail(&email, None, origin, "unknown_email")?;
            return Err(AuthError::InvalidCredentials);
        };

        let password_ok = self
            .hasher
            .verify(password, &user.password_hash, &user.password_salt);
        if !password_ok || !user.is_active {
            let reason = if password_ok {
                "inactive_account"
            } else {
                "invalid_password"
            };
            self.fail(&email, Some(&user.id), origin, reason)?;
            return Err(AuthError::InvalidCredentials);
        }

        self.lockout.clear(&email)?;
        let tokens = self.tokens.issue_token_pair(&user)?;

        tracing::info!(user_id = %user.id, venue_id = %user.venue_id, "User logged in");
        self.audit.log(
            AuditAction::LoginSuccess,
            Some(user.id.clone()),
            origin,
            json!({ "email": email, "venueId": user.venue_id }),
        );

        Ok(LoginResult {
            tokens,
            user: UserInfo::from(&user),
        })
    }

    /// Record a failed attempt and audit it
    fn fail(
        &self,
        email: &str,
        user_id: Option<&str>,
        origin: &ClientOrigin,
        reason: &str,
    ) -> Result<(), AuthError> {
        let status = self.lockout.record_failure(email, origin.ip.as_deref())?;

        security_log!(
            "WARN",
            "login_failed",
            email = email,
            reason = reason,
            attempts = status.failed_attempts
        );
        self.audit.log(
            AuditAction::LoginFailed,
            user_id.map(str::to_string),
            origin,
            json!({
                "email": email,
                "reason": reason,
                "failedAttempts": status.failed_attempts,
            }),
        );

        if status.just_locked {
            self.audit.log(
                AuditAction::AccountLocked,
                user_id.map(str::to_string),
                origin,
                json!({ "email": email, "lockedUntil": status.locked_until }),
            );
        }
        Ok(())
    }

    /// Mint a new access token from a refresh token
    ///
    /// The refresh token is not rotated.
    pub fn refresh(&self, refresh_token: &str, origin: &ClientOrigin) -> Result<String, AuthError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let user = match self.users.find_by_id(&claims.user_id)? {
            Some(user) if user.is_active => user,
            _ => {
                security_log!("WARN", "refresh_rejected", user_id = claims.user_id.as_str());
                return Err(TokenError::Invalid("user unavailable".to_string()).into());
            }
        };

        let token = self.tokens.issue_access_token(&user)?;
        self.audit.log(
            AuditAction::TokenRefreshed,
            Some(user.id.clone()),
            origin,
            json!({ "jti": claims.jti }),
        );
        Ok(token)
    }

    /// Tokens are stateless; logout is only recorded
    pub fn logout(&self, user: &CurrentUser, origin: &ClientOrigin) {
        tracing::info!(user_id = %user.id, "User logged out");
        self.audit.log(
            AuditAction::Logout,
            Some(user.id.clone()),
            origin,
            json!({ "email": user.email }),
        );
    }

    /// Create a staff account
    pub fn provision_user(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
        venue_id: &str,
    ) -> Result<UserInfo, AppError> {
        let email = normalize_email(email);
        validate_email(&email).map_err(AppError::validation)?;
        validate_required_text(venue_id, "venueId", MAX_ID_LEN).map_err(AppError::validation)?;
        let length = password.chars().count();
        if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&length) {
            return Err(AppError::validation(format!(
                "password must be {MIN_PASSWORD_LEN} to {MAX_PASSWORD_LEN} characters"
            )));
        }

        let (password_hash, password_salt) = self
            .hasher
            .hash(password)
            .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))?;

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            password_hash,
            password_salt,
            role,
            venue_id: venue_id.trim().to_string(),
            is_active: true,
            created_at: now_millis(&self.clock),
        };
        self.users.create(&user)?;

        tracing::info!(user_id = %user.id, venue_id = %user.venue_id, role = %user.role, "User provisioned");
        Ok(UserInfo::from(&user))
    }

    /// Enable or disable a staff account
    pub fn set_user_active(&self, email: &str, active: bool) -> Result<UserInfo, AppError> {
        let email = normalize_email(email);
        let mut user = self
            .users
            .find_by_email(&email)?
            .ok_or_else(|| AppError::not_found("User"))?;

        user.is_active = active;
        self.users.update(&user)?;

        tracing::info!(user_id = %user.id, active, "User activation changed");
        Ok(UserInfo::from(&user))
    }
}
