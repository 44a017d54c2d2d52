//! Password verification using Argon2id.

use std::borrow::Cow;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AuthError;

/// The string actually fed to Argon2: the pepper, when configured,
/// followed by the password. Hashing in `altar-db` uses the same layout.
fn with_pepper<'a>(password: &'a str, pepper: Option<&str>) -> Cow<'a, str> {
    match pepper {
        Some(p) => Cow::Owned(format!("{p}{password}")),
        None => Cow::Borrowed(password),
    }
}

/// Check a login password against a stored Argon2id PHC string.
///
/// A malformed stored hash is an error rather than a mismatch, so a
/// corrupted record surfaces as a 500 instead of a silent 401.
pub fn verify_password(
    password: &str,
    stored_hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let stored = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::Crypto(format!("stored hash is not a PHC string: {e}")))?;

    let input = with_pepper(password, pepper);
    match Argon2::default().verify_password(input.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("argon2 verification failed: {e}"))),
    }
}

/// Compare a supplied secret with a configured one in constant time.
///
/// Both sides are digested first so the comparison does not depend on
/// where the inputs differ or on their lengths.
pub fn secrets_match(supplied: &str, expected: &str) -> bool {
    let a = Sha256::digest(supplied.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.as_slice().ct_eq(b.as_slice()).into()
}
