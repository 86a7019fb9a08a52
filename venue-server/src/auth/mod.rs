//! Staff authentication
//!
//! - [`CredentialHasher`]: argon2id password hashing
//! - [`TokenService`]: access/refresh JWTs
//! - [`LockoutGuard`]: failed-login lockout per email
//! - [`AuthService`]: login, refresh, logout
//! - [`CurrentUser`]: extractor for bearer-authenticated routes

mod extractor;
mod jwt;
mod lockout;
mod password;
mod service;

pub use extractor::CurrentUser;
pub use jwt::{AccessClaims, JwtConfig, RefreshClaims, TokenError, TokenPair, TokenService, TokenType};
pub use lockout::{LockoutGuard, LockoutPolicy, LockoutStatus};
pub use password::CredentialHasher;
pub use service::{AuthError, AuthService, LoginResult};
