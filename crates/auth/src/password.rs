use std::sync::OnceLock;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;

use crate::error::{AuthError, Result};

/// Hash a password using Argon2 with a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::HashingFailure(e.to_string()))
}

/// Verify a password against a PHC-encoded hash.
///
/// Mismatches and unparseable hashes both yield `false`; the comparison
/// itself is constant-time inside `argon2`.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Burn the same amount of work as a real verification.
///
/// Used when the account does not exist so that the "unknown email" and
/// "wrong password" paths take comparable time.
pub(crate) fn dummy_verify(password: &str) {
    let hash = dummy_hash();
    if !hash.is_empty() {
        let _ = verify_password(password, hash);
    }
}

pub(crate) static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Hash compared against on unknown-account logins, computed once.
pub(crate) fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| hash_password("dummy-password").unwrap_or_default())
}
