//! Audit log service
//!
//! `log` only enqueues. [`AuditWorker`](super::AuditWorker) does the writes;
//! queries go to storage directly.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::storage::{AuditStorage, PendingEntry};
use super::types::{AuditAction, AuditChainVerification, AuditEntry, ClientOrigin};
use crate::db::StorageResult;
use crate::utils::time::{SharedClock, now_millis};

/// Log request sent to the worker
#[derive(Debug)]
pub struct AuditLogRequest {
    pub(crate) entry: PendingEntry,
}

pub struct AuditService {
    storage: AuditStorage,
    clock: SharedClock,
    tx: mpsc::Sender<AuditLogRequest>,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService").finish_non_exhaustive()
    }
}

impl AuditService {
    /// Create the service and the receiving end for the worker
    pub fn new(
        storage: AuditStorage,
        clock: SharedClock,
        buffer_size: usize,
    ) -> (Arc<Self>, mpsc::Receiver<AuditLogRequest>) {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        let service = Arc::new(Self { storage, clock, tx });
        (service, rx)
    }

    /// Record an event without waiting
    ///
    /// A full or closed channel drops the entry with a warning.
    pub fn log(
        &self,
        action: AuditAction,
        user_id: Option<String>,
        origin: &ClientOrigin,
        details: serde_json::Value,
    ) {
        let request = AuditLogRequest {
            entry: PendingEntry {
                action,
                user_id,
                details,
                ip: origin.ip.clone(),
                user_agent: origin.user_agent.clone(),
                timestamp: now_millis(&self.clock),
            },
        };

        if let Err(e) = self.tx.try_send(request) {
            tracing::warn!(action = %action, error = %e, "Audit entry dropped");
        }
    }

    pub fn recent(&self, limit: usize) -> StorageResult<Vec<AuditEntry>> {
        self.storage.recent(limit)
    }

    pub fn verify_chain(&self) -> StorageResult<AuditChainVerification> {
        self.storage.verify_chain()
    }

    pub fn storage(&self) -> &AuditStorage {
        &self.storage
    }
}
