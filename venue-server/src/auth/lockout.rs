//! Account lockout guard
//!
//! Counts failed logins per normalized email (not per IP). Reaching the
//! threshold locks the email for a fixed duration, after which the next
//! failure starts a fresh count.

use chrono::TimeDelta;

use crate::db::StorageResult;
use crate::db::models::AccountLockout;
use crate::db::repository::LockoutRepository;
use crate::utils::time::{SharedClock, now_millis};

#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lock_duration: TimeDelta,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lock_duration: TimeDelta::minutes(30),
        }
    }
}

/// Outcome of one recorded failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutStatus {
    pub failed_attempts: u32,
    pub locked_until: Option<i64>,
    /// This failure set the lock
    pub just_locked: bool,
}

pub struct LockoutGuard {
    repo: LockoutRepository,
    policy: LockoutPolicy,
    clock: SharedClock,
}

impl LockoutGuard {
    pub fn new(repo: LockoutRepository, policy: LockoutPolicy, clock: SharedClock) -> Self {
        Self {
            repo,
            policy,
            clock,
        }
    }

    pub fn is_locked(&self, email: &str) -> StorageResult<bool> {
        let now = now_millis(&self.clock);
        Ok(self
            .repo
            .get(email)?
            .is_some_and(|record| record.is_locked_at(now)))
    }

    pub fn record_failure(&self, email: &str, ip: Option<&str>) -> StorageResult<LockoutStatus> {
        let now = now_millis(&self.clock);
        let policy = self.policy;
        let mut just_locked = false;

        let record = self.repo.upsert_with(email, |current| {
            let mut record = match current {
                Some(existing) if existing.lock_expired_at(now) => AccountLockout::new(email),
                Some(existing) => existing,
                None => AccountLockout::new(email),
            };

            record.failed_attempts = record.failed_attempts.saturating_add(1);
            record.last_attempt = now;
            record.last_ip = ip.map(str::to_string);

            if record.locked_until.is_none() && record.failed_attempts >= policy.max_attempts {
                record.locked_until = Some(now + policy.lock_duration.num_milliseconds());
                just_locked = true;
            }
            record
        })?;

        if just_locked {
            tracing::warn!(
                email = %email,
                attempts = record.failed_attempts,
                "Account locked after repeated failed logins"
            );
        }

        Ok(LockoutStatus {
            failed_attempts: record.failed_attempts,
            locked_until: record.locked_until,
            just_locked,
        })
    }

    /// Forget all failures (successful login)
    pub fn clear(&self, email: &str) -> StorageResult<()> {
        self.repo.remove(email)?;
        Ok(())
    }

    pub fn status(&self, email: &str) -> StorageResult<Option<AccountLockout>> {
        self.repo.get(email)
    }
}
