//! Secret hashing (Argon2id, via the `argon2` crate).
//!
//! The hash primitive is a library black box; this module only fixes the policy
//! around it (length bounds, PHC string storage, no logging of secrets).

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

use crate::SecretHash;

/// Minimum secret length accepted at signup.
pub const MIN_SECRET_LEN: usize = 8;

/// Upper bound so a single request cannot make hashing arbitrarily expensive.
pub const MAX_SECRET_LEN: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },

    #[error("password must be at most {max} characters")]
    TooLong { max: usize },

    #[error("password hashing failed")]
    Hash,
}

pub fn validate_secret(secret: &str) -> Result<(), PasswordError> {
    let len = secret.chars().count();
    if len < MIN_SECRET_LEN {
        return Err(PasswordError::TooShort { min: MIN_SECRET_LEN });
    }
    if len > MAX_SECRET_LEN {
        return Err(PasswordError::TooLong { max: MAX_SECRET_LEN });
    }
    Ok(())
}

/// Hash a secret using Argon2id with a fresh random salt.
pub fn hash_secret(secret: &str) -> Result<SecretHash, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| SecretHash::from_phc(hash.to_string()))
        .map_err(|_| PasswordError::Hash)
}

/// Verify a presented secret against a stored hash.
///
/// Comparison is done by the Argon2 verifier. A stored hash that fails to parse
/// verifies as `false`.
pub fn verify_secret(hash: &SecretHash, presented: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash.as_phc()) else {
        tracing::warn!("stored secret hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(presented.as_bytes(), &parsed)
        .is_ok()
}

/// Spend the same work as a real verification when no account matched.
///
/// Keeps sign-in latency independent of whether the email is registered.
pub fn verify_against_decoy(presented: &str) {
    static DECOY: OnceLock<Option<SecretHash>> = OnceLock::new();
    if let Some(decoy) = DECOY.get_or_init(|| hash_secret("decoy-secret-never-issued").ok()) {
        let _ = verify_secret(decoy, presented);
    }
}
