//! Password hashing and verification.
//!
//! Stored hashes are Argon2 PHC strings. Verification compares the derived tag
//! in constant time.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::{AuthError, Result};

/// Hash a plaintext password into an Argon2 PHC string with a random salt.
///
/// # Errors
///
/// Returns `Internal` if the system RNG or the hasher fails.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| AuthError::Internal(format!("failed to generate salt: {e}")))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AuthError::Internal(format!("failed to encode salt: {e}")))?;

    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(format!("failed to hash password: {e}")))?
        .to_string();

    Ok(phc)
}

/// Check a plaintext password against a stored hash.
///
/// A stored hash that cannot be parsed never matches.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
