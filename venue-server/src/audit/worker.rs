//! Audit log background worker
//!
//! Exits when every sender is gone.

use tokio::sync::mpsc;

use super::service::AuditLogRequest;
use super::storage::AuditStorage;

pub struct AuditWorker {
    storage: AuditStorage,
}

impl AuditWorker {
    pub fn new(storage: AuditStorage) -> Self {
        Self { storage }
    }

    pub async fn run(self, mut rx: mpsc::Receiver<AuditLogRequest>) {
        tracing::info!("Audit log worker started");

        while let Some(req) = rx.recv().await {
            match self.storage.append(req.entry) {
                Ok(entry) => {
                    tracing::debug!(
                        audit_id = entry.id,
                        action = %entry.action,
                        "Audit entry recorded"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to write audit entry");
                }
            }
        }

        tracing::info!("Audit log channel closed, worker stopping");
    }
}
