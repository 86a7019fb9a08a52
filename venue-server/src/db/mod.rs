//! redb-backed persistence
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `users` | user id | `User` | Staff accounts |
//! | `users_by_email` | normalized email | user id | Unique email index |
//! | `account_lockouts` | normalized email | `AccountLockout` | Failed login tracking |
//! | `audit_logs` | sequence | `AuditEntry` | Append-only security log |
//! | `orders` | order id | `Order` | Orders |
//! | `order_numbers` | order number | order id | Unique tracking index |
//! | `venue_orders` | `(venue_id, sequence)` | order id | Per-venue listing |
//! | `venue_counters` | venue id | `u64` | Last issued order sequence |
//!
//! Values are JSON. Every read-modify-write happens inside one write
//! transaction; redb admits a single writer at a time, which is what makes
//! counter increments and conditional inserts atomic.

pub mod models;
pub mod repository;

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadTransaction, ReadableDatabase, TableDefinition, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

pub(crate) const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
pub(crate) const USERS_BY_EMAIL_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("users_by_email");
pub(crate) const LOCKOUTS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("account_lockouts");
pub(crate) const AUDIT_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("audit_logs");
pub(crate) const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");
pub(crate) const ORDER_NUMBERS_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("order_numbers");
pub(crate) const VENUE_ORDERS_TABLE: TableDefinition<(&str, u64), &str> =
    TableDefinition::new("venue_orders");
pub(crate) const VENUE_COUNTERS_TABLE: TableDefinition<&str, u64> =
    TableDefinition::new("venue_counters");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A unique key is already taken
    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            other => {
                tracing::error!(error = %other, "Storage operation failed");
                AppError::storage_unavailable()
            }
        }
    }
}

/// Handle to the embedded database
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    /// Open or create the database file
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::init(Database::create(path)?)
    }

    /// Open a database that lives only in memory (tests, demos)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS_TABLE)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL_TABLE)?;
            let _ = write_txn.open_table(LOCKOUTS_TABLE)?;
            let _ = write_txn.open_table(AUDIT_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_NUMBERS_TABLE)?;
            let _ = write_txn.open_table(VENUE_ORDERS_TABLE)?;
            let _ = write_txn.open_table(VENUE_COUNTERS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    pub(crate) fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    pub(crate) fn begin_read(&self) -> StorageResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_file_database_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("venue.redb");

        let storage = Storage::open(&path).unwrap();
        drop(storage);

        // Re-opening an existing file keeps the tables
        Storage::open(&path).unwrap();
    }

    #[test]
    fn test_conflict_maps_to_already_exists() {
        let err: AppError = StorageError::Conflict("email taken".to_string()).into();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
    }

    #[test]
    fn test_other_errors_map_to_unavailable() {
        let json_err = serde_json::from_str::<u32>("x").unwrap_err();
        let err: AppError = StorageError::Serialization(json_err).into();
        assert_eq!(err.code, ErrorCode::StorageUnavailable);
        assert_eq!(err.http_status(), http::StatusCode::SERVICE_UNAVAILABLE);
    }
}
