//! Password value object - Domain layer password handling.
//!
//! Wraps Argon2id with a fixed work factor. The PHC string embeds salt and
//! parameters, so a stored hash is self-describing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::{ARGON2_ITERATIONS, ARGON2_MEMORY_KIB, ARGON2_PARALLELISM};
use crate::errors::{AppError, AppResult};

/// Hashed password. Values of this type never hold plain text.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output (security)
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash a plain text password.
    ///
    /// CPU-bound; async callers should go through [`Password::hash_blocking`].
    pub fn new(plain_text: &str) -> AppResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()?
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?;
        Ok(Self {
            hash: hash.to_string(),
        })
    }

    /// Hash on the blocking thread pool.
    pub async fn hash_blocking(plain_text: String) -> AppResult<Self> {
        tokio::task::spawn_blocking(move || Self::new(&plain_text))
            .await
            .map_err(|e| AppError::internal(format!("Password hash task failed: {}", e)))?
    }

    /// Create a Password from an existing hash (from database).
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this hash.
    ///
    /// A malformed hash verifies as `false`. An empty hash means the stored
    /// record is broken and is reported as an internal error.
    pub fn verify(&self, plain_text: &str) -> AppResult<bool> {
        if self.hash.is_empty() {
            return Err(AppError::internal("Password hash missing on user"));
        }

        let Ok(parsed) = PasswordHash::new(&self.hash) else {
            return Ok(false);
        };

        Ok(Argon2::default()
            .verify_password(plain_text.as_bytes(), &parsed)
            .is_ok())
    }

    /// Verify on the blocking thread pool.
    pub async fn verify_blocking(self, plain_text: String) -> AppResult<bool> {
        tokio::task::spawn_blocking(move || self.verify(&plain_text))
            .await
            .map_err(|e| AppError::internal(format!("Password verify task failed: {}", e)))?
    }

    /// Argon2id with the application's fixed work factor.
    fn argon2() -> AppResult<Argon2<'static>> {
        let params = Params::new(ARGON2_MEMORY_KIB, ARGON2_ITERATIONS, ARGON2_PARALLELISM, None)
            .map_err(|e| AppError::internal(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Password {}
