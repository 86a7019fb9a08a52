//! Account lockout records

use redb::ReadableTable;

use crate::db::models::AccountLockout;
use crate::db::{LOCKOUTS_TABLE, Storage, StorageResult, decode, encode};

#[derive(Clone)]
pub struct LockoutRepository {
    storage: Storage,
}

impl LockoutRepository {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn get(&self, email: &str) -> StorageResult<Option<AccountLockout>> {
        let txn = self.storage.begin_read()?;
        let table = txn.open_table(LOCKOUTS_TABLE)?;
        let record = match table.get(email)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(record)
    }

    /// Read-modify-write of one record inside a single write transaction
    pub fn upsert_with<F>(&self, email: &str, f: F) -> StorageResult<AccountLockout>
    where
        F: FnOnce(Option<AccountLockout>) -> AccountLockout,
    {
        let txn = self.storage.begin_write()?;
        let updated = {
            let mut table = txn.open_table(LOCKOUTS_TABLE)?;
            let current: Option<AccountLockout> = match table.get(email)? {
                Some(guard) => Some(decode(guard.value())?),
                None => None,
            };
            let updated = f(current);
            let bytes = encode(&updated)?;
            table.insert(email, bytes.as_slice())?;
            updated
        };
        txn.commit()?;
        Ok(updated)
    }

    /// Delete the record; returns whether one existed
    pub fn remove(&self, email: &str) -> StorageResult<bool> {
        let txn = self.storage.begin_write()?;
        let existed = {
            let mut table = txn.open_table(LOCKOUTS_TABLE)?;
            table.remove(email)?.is_some()
        };
        txn.commit()?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_creates_then_updates() {
        let repo = LockoutRepository::new(Storage::open_in_memory().unwrap());

        let first = repo
            .upsert_with("a@venue.test", |current| {
                assert!(current.is_none());
                let mut record = AccountLockout::new("a@venue.test");
                record.failed_attempts = 1;
                record
            })
            .unwrap();
        assert_eq!(first.failed_attempts, 1);

        let second = repo
            .upsert_with("a@venue.test", |current| {
                let mut record = current.unwrap();
                record.failed_attempts += 1;
                record
            })
            .unwrap();
        assert_eq!(second.failed_attempts, 2);
        assert_eq!(repo.get("a@venue.test").unwrap(), Some(second));
    }

    #[test]
    fn test_remove() {
        let repo = LockoutRepository::new(Storage::open_in_memory().unwrap());
        assert!(!repo.remove("a@venue.test").unwrap());

        repo.upsert_with("a@venue.test", |_| AccountLockout::new("a@venue.test"))
            .unwrap();
        assert!(repo.remove("a@venue.test").unwrap());
        assert!(repo.get("a@venue.test").unwrap().is_none());
    }
}
