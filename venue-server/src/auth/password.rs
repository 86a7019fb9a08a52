//! Password hashing (argon2id)
//!
//! Hash and salt are stored separately on the user record. The salt is also
//! embedded in the PHC string; verification requires both to agree.

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

/// Password input used for the dummy verification on unknown emails
const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-accounts";

pub struct CredentialHasher {
    params: Params,
    dummy_hash: OnceLock<(String, String)>,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .finish_non_exhaustive()
    }
}

impl CredentialHasher {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            dummy_hash: OnceLock::new(),
        }
    }

    /// Hasher with the given memory (KiB) and iteration cost
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, argon2::Error> {
        Ok(Self::new(Params::new(memory_kib, iterations, 1, None)?))
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Returns `(phc_hash, salt)`
    pub fn hash(&self, password: &str) -> Result<(String, String), argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2().hash_password(password.as_bytes(), &salt)?;
        Ok((hash.to_string(), salt.as_str().to_string()))
    }

    /// Constant-time comparison; any malformed input is a mismatch
    pub fn verify(&self, password: &str, hash: &str, salt: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        if parsed.salt.map(|s| s.as_str()) != Some(salt) {
            return false;
        }
        // Cost parameters are read from the PHC string
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burn one verification so unknown emails cost the same as known ones
    pub fn verify_dummy(&self, password: &str) {
        let (hash, salt) = self.dummy_hash.get_or_init(|| {
            self.hash(DUMMY_PASSWORD).unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to prepare dummy password hash");
                (String::new(), String::new())
            })
        });
        let _ = self.verify(password, hash, salt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::with_cost(1024, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let (hash, salt) = hasher.hash("correct horse battery").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains(&salt));
        assert!(hasher.verify("correct horse battery", &hash, &salt));
        assert!(!hasher.verify("correct horse batterY", &hash, &salt));
    }

    #[test]
    fn test_salts_are_unique() {
        let hasher = hasher();
        let (hash_a, salt_a) = hasher.hash("same").unwrap();
        let (hash_b, salt_b) = hasher.hash("same").unwrap();
        assert_ne!(salt_a, salt_b);
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn test_mismatched_salt_fails() {
        let hasher = hasher();
        let (hash, _) = hasher.hash("secret-password").unwrap();
        let (_, other_salt) = hasher.hash("secret-password").unwrap();
        assert!(!hasher.verify("secret-password", &hash, &other_salt));
    }

    #[test]
    fn test_malformed_hash_fails() {
        assert!(!hasher().verify("x", "not-a-phc-string", "salt"));
        hasher().verify_dummy("anything");
    }
}
