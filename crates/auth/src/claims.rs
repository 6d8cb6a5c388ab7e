use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use souk_core::PrincipalId;

use crate::{PrincipalDescriptor, Role};

/// Token claims model (transport-agnostic).
///
/// The minimal set of claims souk expects once a token has been decoded and its
/// signature verified. Identity and role only: no brand reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject / principal identifier.
    pub sub: PrincipalId,

    /// Role granted to the subject.
    pub role: Role,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    pub fn descriptor(&self) -> PrincipalDescriptor {
        PrincipalDescriptor::new(self.sub, self.role)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate token claims.
///
/// This validates the *claims* only. Signature verification happens in
/// [`crate::token`].
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims_at(issued_at: DateTime<Utc>, ttl: Duration) -> TokenClaims {
        TokenClaims {
            sub: PrincipalId::new(),
            role: Role::Client,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    #[test]
    fn accepts_inside_window() {
        let now = Utc::now();
        let claims = claims_at(now - Duration::minutes(1), Duration::minutes(10));
        assert_eq!(validate_claims(&claims, now), Ok(()));
    }

    #[test]
    fn expiry_is_exclusive() {
        let now = Utc::now();
        let claims = claims_at(now - Duration::minutes(10), Duration::minutes(10));
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn rejects_future_issue_and_inverted_window() {
        let now = Utc::now();
        let future = claims_at(now + Duration::minutes(1), Duration::minutes(10));
        assert_eq!(validate_claims(&future, now), Err(TokenValidationError::NotYetValid));

        let inverted = claims_at(now, Duration::minutes(-1));
        assert_eq!(
            validate_claims(&inverted, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
