//! Account records (the persisted side of a principal).
//!
//! # Invariants
//! - `owned_brand_id` is `Some` iff `role == BrandOwner`. The public constructors
//!   make any other combination unrepresentable; [`Account::restore`] rejects it
//!   when rehydrating from storage.
//! - `role` is fixed at creation (no setter exists).
//! - The secret hash is never serialized and never printed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souk_core::{BrandId, DomainError, DomainResult, Email, Entity, PrincipalId};

use crate::{PrincipalDescriptor, Role};

/// Argon2 PHC string for a stored secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretHash(String);

impl SecretHash {
    pub fn from_phc(phc: String) -> Self {
        Self(phc)
    }

    pub fn as_phc(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SecretHash(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    id: PrincipalId,
    email: Email,
    #[serde(skip)]
    secret_hash: SecretHash,
    role: Role,
    owned_brand_id: Option<BrandId>,
    display_name: String,
    created_at: DateTime<Utc>,
}

impl Account {
    pub fn client(
        id: PrincipalId,
        email: Email,
        secret_hash: SecretHash,
        display_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::build(id, email, secret_hash, Role::Client, None, display_name.into(), now)
    }

    pub fn admin(
        id: PrincipalId,
        email: Email,
        secret_hash: SecretHash,
        display_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::build(id, email, secret_hash, Role::Admin, None, display_name.into(), now)
    }

    pub fn brand_owner(
        id: PrincipalId,
        email: Email,
        secret_hash: SecretHash,
        display_name: impl Into<String>,
        brand_id: BrandId,
        now: DateTime<Utc>,
    ) -> Self {
        Self::build(
            id,
            email,
            secret_hash,
            Role::BrandOwner,
            Some(brand_id),
            display_name.into(),
            now,
        )
    }

    /// Rehydrate an account from storage, re-checking the role/brand invariant.
    pub fn restore(
        id: PrincipalId,
        email: Email,
        secret_hash: SecretHash,
        role: Role,
        owned_brand_id: Option<BrandId>,
        display_name: String,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if role.owns_brand() != owned_brand_id.is_some() {
            return Err(DomainError::invariant(format!(
                "account {id} has role {role} but owned_brand_id is {owned_brand_id:?}"
            )));
        }
        Ok(Self::build(
            id,
            email,
            secret_hash,
            role,
            owned_brand_id,
            display_name,
            created_at,
        ))
    }

    fn build(
        id: PrincipalId,
        email: Email,
        secret_hash: SecretHash,
        role: Role,
        owned_brand_id: Option<BrandId>,
        display_name: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            secret_hash,
            role,
            owned_brand_id,
            display_name: display_name.trim().to_string(),
            created_at,
        }
    }

    pub fn id_typed(&self) -> PrincipalId {
        self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn secret_hash(&self) -> &SecretHash {
        &self.secret_hash
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn owned_brand_id(&self) -> Option<BrandId> {
        self.owned_brand_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn descriptor(&self) -> PrincipalDescriptor {
        PrincipalDescriptor::new(self.id, self.role)
    }

    /// Check a presented secret against this account's stored hash.
    pub fn verify_secret(&self, presented: &str) -> bool {
        crate::password::verify_secret(&self.secret_hash, presented)
    }
}

impl Entity for Account {
    type Id = PrincipalId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
