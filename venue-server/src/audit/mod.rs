//! Security audit log
//!
//! Entries are append-only and chained with SHA-256: every entry stores the
//! hash of its predecessor, so any edit or deletion breaks the chain.
//!
//! Writes go through a bounded channel to [`AuditWorker`]; the request path
//! never waits on storage and never fails because of the audit log.

mod service;
mod storage;
mod types;
mod worker;

pub use service::{AuditLogRequest, AuditService};
pub use storage::AuditStorage;
pub use types::{AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry, ClientOrigin};
pub use worker::AuditWorker;
