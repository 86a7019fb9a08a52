//! Server-side records with no client-facing counterpart

use serde::{Deserialize, Serialize};

/// Failed login tracking for one normalized email
///
/// Exists from the first failed attempt until the next successful login.
/// May exist for emails that have no user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLockout {
    pub email: String,
    pub failed_attempts: u32,
    /// Unix millis of the latest failure
    pub last_attempt: i64,
    #[serde(default)]
    pub locked_until: Option<i64>,
    #[serde(default)]
    pub last_ip: Option<String>,
}

impl AccountLockout {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            failed_attempts: 0,
            last_attempt: 0,
            locked_until: None,
            last_ip: None,
        }
    }

    /// Locked iff `locked_until` is in the future
    pub fn is_locked_at(&self, now_ms: i64) -> bool {
        self.locked_until.is_some_and(|until| until > now_ms)
    }

    /// A lock was set and has run out
    pub fn lock_expired_at(&self, now_ms: i64) -> bool {
        self.locked_until.is_some_and(|until| until <= now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_window_is_exclusive_at_end() {
        let mut record = AccountLockout::new("a@b.test");
        assert!(!record.is_locked_at(0));

        record.locked_until = Some(1_000);
        assert!(record.is_locked_at(999));
        assert!(!record.is_locked_at(1_000));
        assert!(record.lock_expired_at(1_000));
        assert!(!record.lock_expired_at(999));
    }
}
