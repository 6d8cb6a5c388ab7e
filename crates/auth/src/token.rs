//! Signed, time-bounded identity tokens (HS256 JWT via `jsonwebtoken`).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use thiserror::Error;

use crate::claims::{TokenClaims, TokenValidationError, validate_claims};
use crate::{Account, PrincipalDescriptor};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad encoding, bad signature, or claims that do not deserialize.
    #[error("malformed or unverifiable token")]
    Malformed,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("failed to sign token")]
    Encode,
}

/// A freshly issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issue and verify identity tokens.
pub trait TokenCodec: Send + Sync {
    fn issue(&self, account: &Account, now: DateTime<Utc>) -> Result<IssuedToken, TokenError>;

    /// Verify signature and time window, yielding the asserted identity.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<PrincipalDescriptor, TokenError>;
}

/// HMAC-SHA256 token codec with a shared secret.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn validation() -> Validation {
        // Time checks are done on our own claims by `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn issue(&self, account: &Account, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now.checked_add_signed(self.ttl).ok_or(TokenError::Encode)?;
        let claims = TokenClaims {
            sub: account.id_typed(),
            role: account.role(),
            issued_at: now,
            expires_at,
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Encode)?;
        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at,
        })
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<PrincipalDescriptor, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &Self::validation())
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                TokenError::Malformed
            })?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims.descriptor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Role, SecretHash};
    use souk_core::{Email, PrincipalId};

    fn account() -> Account {
        Account::client(
            PrincipalId::new(),
            Email::parse("c@x.tn").unwrap(),
            SecretHash::from_phc(String::new()),
            "C",
            Utc::now(),
        )
    }

    fn codec(secret: &str) -> Hs256TokenCodec {
        Hs256TokenCodec::new(secret.as_bytes(), Duration::minutes(10))
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let codec = codec("test-secret");
        let account = account();
        let now = Utc::now();
        let issued = codec.issue(&account, now).unwrap();
        assert_eq!(issued.expires_at, now + Duration::minutes(10));

        let descriptor = codec.verify(&issued.token, now).unwrap();
        assert_eq!(descriptor.principal_id, account.id_typed());
        assert_eq!(descriptor.role, Role::Client);
    }

    #[test]
    fn ttl_past_the_calendar_range_fails_instead_of_panicking() {
        let codec = Hs256TokenCodec::new(b"test-secret", Duration::minutes(100_000_000_000_000));
        assert_eq!(codec.issue(&account(), Utc::now()), Err(TokenError::Encode));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let now = Utc::now();
        let issued = codec("other-secret").issue(&account(), now).unwrap();
        assert_eq!(codec("test-secret").verify(&issued.token, now), Err(TokenError::Malformed));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let codec = codec("test-secret");
        let now = Utc::now();
        let issued = codec.issue(&account(), now).unwrap();

        // Same header and signature, payload swapped for one claiming admin.
        let admin_claims = TokenClaims {
            sub: PrincipalId::new(),
            role: Role::Admin,
            issued_at: now,
            expires_at: now + Duration::minutes(10),
        };
        let attacker = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &admin_claims,
            &EncodingKey::from_secret(b"attacker"),
        )
        .unwrap();
        let forged_payload = attacker.split('.').nth(1).unwrap();

        let mut parts: Vec<&str> = issued.token.split('.').collect();
        parts[1] = forged_payload;
        let forged = parts.join(".");

        assert_eq!(codec.verify(&forged, now), Err(TokenError::Malformed));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec("test-secret");
        let issued_at = Utc::now() - Duration::minutes(30);
        let issued = codec.issue(&account(), issued_at).unwrap();
        assert_eq!(
            codec.verify(&issued.token, Utc::now()),
            Err(TokenError::Claims(TokenValidationError::Expired))
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(codec("s").verify("not.a.jwt", Utc::now()), Err(TokenError::Malformed));
    }
}
