//! Credential hashing for the in-process data service.
//!
//! The hosted service hashes credentials on its own side; only
//! [`MemoryDataService`](crate::remote::MemoryDataService) stores hashes
//! locally. Hashes are Argon2id in PHC string format.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::OsRng;
use thiserror::Error;

/// Argon2id memory cost in KiB.
const MEMORY_COST_KIB: u32 = 19 * 1024;
/// Argon2id passes over memory.
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The stored value is not a PHC hash string.
    #[error("malformed password hash")]
    Malformed,

    #[error("password does not match")]
    Mismatch,
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password with a fresh random salt.
///
/// # Examples
///
/// ```
/// use alumni_connect::auth::hash_password;
///
/// let hash = hash_password("correct horse").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check `password` against a stored hash. The cost parameters are read
/// from the hash itself.
///
/// ```
/// use alumni_connect::auth::{hash_password, verify_password};
///
/// let hash = hash_password("correct horse").unwrap();
/// assert!(verify_password("correct horse", &hash).is_ok());
/// assert!(verify_password("battery staple", &hash).is_err());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let stored = PasswordHash::new(hash).map_err(|_| PasswordError::Malformed)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &stored)
        .map_err(|_| PasswordError::Mismatch)
}
