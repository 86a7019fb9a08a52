//! Audit log types

use serde::{Deserialize, Serialize};

/// Audited security event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    // Authentication
    LoginSuccess,
    LoginFailed,
    /// Attempt refused because the account is locked
    LoginBlocked,
    /// Failure threshold reached, lock set
    AccountLocked,
    Logout,
    TokenRefreshed,

    // Abuse
    RateLimitExceeded,

    // Orders
    OrderCreated,
    OrderStatusChanged,
    /// Staff tried to act on another venue's order
    CrossVenueDenied,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "LOGIN_SUCCESS",
            Self::LoginFailed => "LOGIN_FAILED",
            Self::LoginBlocked => "LOGIN_BLOCKED",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::Logout => "LOGOUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::OrderCreated => "ORDER_CREATED",
            Self::OrderStatusChanged => "ORDER_STATUS_CHANGED",
            Self::CrossVenueDenied => "CROSS_VENUE_DENIED",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a request came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOrigin {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientOrigin {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: Some(ip.into()),
            user_agent: None,
        }
    }
}

/// Audit log entry (immutable)
///
/// - `prev_hash`: `curr_hash` of the previous entry, `"genesis"` for the first
/// - `curr_hash`: SHA-256 over `prev_hash` and every other field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Sequence number, starts at 1
    pub id: u64,
    pub action: AuditAction,
    pub user_id: Option<String>,
    pub details: serde_json::Value,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    /// Unix millis, taken when the event was logged
    pub timestamp: i64,
    pub prev_hash: String,
    pub curr_hash: String,
}

/// Result of walking the hash chain
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditChainVerification {
    pub total_entries: u64,
    pub chain_intact: bool,
    pub breaks: Vec<AuditChainBreak>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditChainBreak {
    pub entry_id: u64,
    pub expected_prev_hash: String,
    pub actual_prev_hash: String,
}
