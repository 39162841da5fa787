//! Argon2id password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use tracing::debug;

use authgate_core::error::AppError;

/// Handles password hashing and verification using Argon2id.
///
/// Stateless and cheap to clone. Both operations are CPU-bound; async callers
/// should run them on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a new password hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext password using Argon2id with a fresh random salt.
    ///
    /// The result is a PHC string embedding the algorithm, parameters, and
    /// salt, so two calls on the same input never return the same string.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored hash.
    ///
    /// The digest comparison is constant-time. A hash that cannot be parsed
    /// counts as a mismatch.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash_password("Str0ng!Pass").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("Str0ng!Pass", &hash));
        assert!(!hasher.verify_password("Str0ng!Pasz", &hash));
        assert!(!hasher.verify_password("", &hash));
    }

    #[test]
    fn test_salt_differs_per_call() {
        let hasher = PasswordHasher::new();
        let a = hasher.hash_password("Str0ng!Pass").unwrap();
        let b = hasher.hash_password("Str0ng!Pass").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify_password("Str0ng!Pass", &a));
        assert!(hasher.verify_password("Str0ng!Pass", &b));
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify_password("Str0ng!Pass", "not-a-phc-string"));
        assert!(!hasher.verify_password("Str0ng!Pass", ""));
        assert!(!hasher.verify_password("Str0ng!Pass", "$argon2id$v=19$m=19456"));
    }
}
