//! Operator account helpers.
//!
//! ```bash
//! # Generate ADMIN_PASSWORD_HASH
//! opal admin hash-password < password.txt
//! ```

use std::io::{BufRead, Write};

use opal_admin::services::auth::{AuthError, hash_password};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no password given on stdin")]
    EmptyPassword,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Hash the first line of `input` for use as `ADMIN_PASSWORD_HASH`.
///
/// # Errors
///
/// Returns an error for an empty or weak password.
pub fn hash_from_reader(input: impl BufRead) -> Result<String, AdminError> {
    let password = input
        .lines()
        .next()
        .transpose()?
        .map(|line| line.trim_end_matches('\r').to_string())
        .filter(|line| !line.is_empty())
        .ok_or(AdminError::EmptyPassword)?;
    Ok(hash_password(&password)?)
}

/// Read a password from stdin and print its hash.
///
/// # Errors
///
/// Returns an error for an empty or weak password.
pub fn hash_password_from_stdin() -> Result<(), AdminError> {
    let hash = hash_from_reader(std::io::stdin().lock())?;
    writeln!(std::io::stdout().lock(), "{hash}")?;
    Ok(())
}
