//! Audit log storage on redb
//!
//! Only `append` writes. There is no update or delete.

use redb::ReadableTable;
use sha2::{Digest, Sha256};

use super::types::{AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry};
use crate::db::{AUDIT_TABLE, Storage, StorageResult, decode, encode};

const GENESIS_HASH: &str = "genesis";

/// Fields of an entry before it is sequenced and hashed
#[derive(Debug, Clone)]
pub(crate) struct PendingEntry {
    pub action: AuditAction,
    pub user_id: Option<String>,
    pub details: serde_json::Value,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: i64,
}

#[derive(Clone)]
pub struct AuditStorage {
    storage: Storage,
}

impl AuditStorage {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Append one entry
    ///
    /// Reading the chain head and inserting happen in the same write
    /// transaction, so concurrent appends cannot share a sequence number.
    pub(crate) fn append(&self, pending: PendingEntry) -> StorageResult<AuditEntry> {
        let txn = self.storage.begin_write()?;
        let entry = {
            let mut table = txn.open_table(AUDIT_TABLE)?;
            let (last_id, prev_hash) = match table.last()? {
                Some((key, value)) => {
                    let last: AuditEntry = decode(value.value())?;
                    (key.value(), last.curr_hash)
                }
                None => (0, GENESIS_HASH.to_string()),
            };

            let id = last_id + 1;
            let curr_hash = compute_audit_hash(&prev_hash, id, &pending);
            let entry = AuditEntry {
                id,
                action: pending.action,
                user_id: pending.user_id,
                details: pending.details,
                ip: pending.ip,
                user_agent: pending.user_agent,
                timestamp: pending.timestamp,
                prev_hash,
                curr_hash,
            };
            let bytes = encode(&entry)?;
            table.insert(id, bytes.as_slice())?;
            entry
        };
        txn.commit()?;
        Ok(entry)
    }

    /// Newest entries first
    pub fn recent(&self, limit: usize) -> StorageResult<Vec<AuditEntry>> {
        let txn = self.storage.begin_read()?;
        let table = txn.open_table(AUDIT_TABLE)?;
        let mut entries = Vec::with_capacity(limit.min(256));
        for row in table.iter()?.rev().take(limit) {
            let (_, value) = row?;
            entries.push(decode(value.value())?);
        }
        Ok(entries)
    }

    /// Walk the whole chain, checking links and recomputing hashes
    pub fn verify_chain(&self) -> StorageResult<AuditChainVerification> {
        let txn = self.storage.begin_read()?;
        let table = txn.open_table(AUDIT_TABLE)?;

        let mut expected_prev = GENESIS_HASH.to_string();
        let mut total_entries = 0u64;
        let mut breaks = Vec::new();

        for row in table.iter()? {
            let (_, value) = row?;
            let entry: AuditEntry = decode(value.value())?;
            total_entries += 1;

            let recomputed = compute_audit_hash(
                &entry.prev_hash,
                entry.id,
                &PendingEntry {
                    action: entry.action,
                    user_id: entry.user_id.clone(),
                    details: entry.details.clone(),
                    ip: entry.ip.clone(),
                    user_agent: entry.user_agent.clone(),
                    timestamp: entry.timestamp,
                },
            );

            if entry.prev_hash != expected_prev || entry.curr_hash != recomputed {
                breaks.push(AuditChainBreak {
                    entry_id: entry.id,
                    expected_prev_hash: expected_prev.clone(),
                    actual_prev_hash: entry.prev_hash.clone(),
                });
            }
            expected_prev = entry.curr_hash;
        }

        Ok(AuditChainVerification {
            total_entries,
            chain_intact: breaks.is_empty(),
            breaks,
        })
    }

    #[cfg(test)]
    fn overwrite_raw(&self, entry: &AuditEntry) -> StorageResult<()> {
        let txn = self.storage.begin_write()?;
        {
            let mut table = txn.open_table(AUDIT_TABLE)?;
            let bytes = encode(entry)?;
            table.insert(entry.id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}

/// SHA-256 over all fields, NUL-separated
///
/// `details` is hashed as serialized JSON; `serde_json` object keys are
/// sorted, so the encoding is stable.
fn compute_audit_hash(prev_hash: &str, id: u64, entry: &PendingEntry) -> String {
    let mut hasher = Sha256::new();

    hasher.update(prev_hash.as_bytes());
    hasher.update(b"\x00");

    hasher.update(id.to_le_bytes());
    hasher.update(entry.timestamp.to_le_bytes());

    hasher.update(entry.action.as_str().as_bytes());
    hasher.update(b"\x00");

    hash_optional(&mut hasher, entry.user_id.as_deref());
    hash_optional(&mut hasher, entry.ip.as_deref());
    hash_optional(&mut hasher, entry.user_agent.as_deref());

    let details_json = serde_json::to_string(&entry.details).unwrap_or_default();
    hasher.update(details_json.as_bytes());
    hasher.update(b"\x00");

    hex::encode(hasher.finalize())
}

/// `\x00` = None, `\x01` + bytes = Some, then a separator
fn hash_optional(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update(b"\x01");
            hasher.update(v.as_bytes());
        }
        None => hasher.update(b"\x00"),
    }
    hasher.update(b"\x00");
}
