//! # Password hashing and verification (Argon2id)
//!
//! - [`hash_password`] generates a random salt via [`OsRng`], hashes the plaintext
//!   with the default Argon2id parameters and returns a PHC-format string
//!   (e.g. `$argon2id$v=19$m=19456,t=2,p=1$...`), stored in `users.password_hash`.
//! - [`verify_password`] parses a PHC string and checks the plaintext against it.
//!   `Ok(false)` on mismatch, `Err` if the stored hash is malformed.
//!
//! Request handlers use the `*_blocking` variants, which run on tokio's
//! blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{AppError, Result};

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::PasswordHash(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::PasswordHash(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?
}
