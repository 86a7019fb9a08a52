//! User Repository

use redb::ReadableTable;
use shared::models::User;

use crate::db::{
    Storage, StorageError, StorageResult, USERS_BY_EMAIL_TABLE, USERS_TABLE, decode, encode,
};

#[derive(Clone)]
pub struct UserRepository {
    storage: Storage,
}

impl UserRepository {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Look up by normalized email
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let txn = self.storage.begin_read()?;
        let index = txn.open_table(USERS_BY_EMAIL_TABLE)?;
        let Some(user_id) = index.get(email)?.map(|guard| guard.value().to_string()) else {
            return Ok(None);
        };

        let users = txn.open_table(USERS_TABLE)?;
        let user = match users.get(user_id.as_str())? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(user)
    }

    pub fn find_by_id(&self, user_id: &str) -> StorageResult<Option<User>> {
        let txn = self.storage.begin_read()?;
        let users = txn.open_table(USERS_TABLE)?;
        let user = match users.get(user_id)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(user)
    }

    /// Insert a new user; fails with `Conflict` if the email is taken
    pub fn create(&self, user: &User) -> StorageResult<()> {
        let txn = self.storage.begin_write()?;
        {
            let mut index = txn.open_table(USERS_BY_EMAIL_TABLE)?;
            if index.get(user.email.as_str())?.is_some() {
                return Err(StorageError::Conflict(format!(
                    "user with email {} already exists",
                    user.email
                )));
            }
            index.insert(user.email.as_str(), user.id.as_str())?;

            let mut users = txn.open_table(USERS_TABLE)?;
            let bytes = encode(user)?;
            users.insert(user.id.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Replace a stored user (same id, same email)
    pub fn update(&self, user: &User) -> StorageResult<()> {
        let txn = self.storage.begin_write()?;
        {
            let mut users = txn.open_table(USERS_TABLE)?;
            let bytes = encode(user)?;
            users.insert(user.id.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::UserRole;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            password_salt: "salt".to_string(),
            role: UserRole::Manager,
            venue_id: "venue-1".to_string(),
            is_active: true,
            created_at: 0,
        }
    }

    #[test]
    fn test_create_and_find() {
        let repo = UserRepository::new(Storage::open_in_memory().unwrap());
        repo.create(&user("u-1", "a@venue.test")).unwrap();

        let by_email = repo.find_by_email("a@venue.test").unwrap().unwrap();
        assert_eq!(by_email.id, "u-1");

        let by_id = repo.find_by_id("u-1").unwrap().unwrap();
        assert_eq!(by_id.email, "a@venue.test");

        assert!(repo.find_by_email("b@venue.test").unwrap().is_none());
        assert!(repo.find_by_id("u-2").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_is_rejected() {
        let repo = UserRepository::new(Storage::open_in_memory().unwrap());
        repo.create(&user("u-1", "a@venue.test")).unwrap();

        let err = repo.create(&user("u-2", "a@venue.test")).unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
        // The losing insert left nothing behind
        assert!(repo.find_by_id("u-2").unwrap().is_none());
    }

    #[test]
    fn test_update_deactivates() {
        let repo = UserRepository::new(Storage::open_in_memory().unwrap());
        let mut u = user("u-1", "a@venue.test");
        repo.create(&u).unwrap();

        u.is_active = false;
        repo.update(&u).unwrap();
        assert!(!repo.find_by_email("a@venue.test").unwrap().unwrap().is_active);
    }
}
