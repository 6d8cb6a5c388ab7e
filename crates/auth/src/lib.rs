//! `souk-auth` — authentication and authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! hash and verify secrets, issue and verify tokens, and evaluate the access
//! policy once ownership facts have been resolved by the caller.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod password;
pub mod principal;
pub mod roles;
pub mod token;

pub use account::{Account, SecretHash};
pub use authorize::{
    Action, ActionPolicy, Decision, DenyReason, Resolution, ResourceOwner, ResourceRef, evaluate,
    needs_resolution,
};
pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use password::{
    PasswordError, hash_secret, validate_secret, verify_against_decoy, verify_secret,
};
pub use principal::PrincipalDescriptor;
pub use roles::{ParseRoleError, Role};
pub use token::{Hs256TokenCodec, IssuedToken, TokenCodec, TokenError};
