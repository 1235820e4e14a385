//! Operator authentication.
//!
//! There is a single operator account configured through the environment.
//! The password is checked against an Argon2 PHC hash; the plaintext is
//! never stored.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::AdminCredentials;

/// Minimum password length accepted by [`hash_password`].
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password. Deliberately does not say which.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    #[error("failed to hash password")]
    PasswordHash,
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `WeakPassword` for short passwords, `PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `InvalidCredentials` if the password does not match or the hash
/// cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Check a login attempt against the operator account.
///
/// The password is verified even when the email does not match so both
/// failures take the same time.
///
/// # Errors
///
/// Returns `InvalidCredentials` on any mismatch.
pub fn authenticate(
    credentials: &AdminCredentials,
    email: &str,
    password: &str,
) -> Result<(), AuthError> {
    let password_ok = verify_password(password, credentials.password_hash.expose_secret()).is_ok();
    if password_ok && credentials.email.matches(email.trim()) {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}
