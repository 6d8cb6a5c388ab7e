use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of an account.
///
/// Roles are fixed at account creation; there is no role-upgrade flow.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A shopper (favorites, public catalog).
    Client,
    /// Owns exactly one brand and manages its products.
    BrandOwner,
    /// Back-office moderator.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::BrandOwner => "brand_owner",
            Role::Admin => "admin",
        }
    }

    /// Whether accounts with this role must reference an owned brand.
    pub fn owns_brand(&self) -> bool {
        matches!(self, Role::BrandOwner)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct ParseRoleError(pub String);

impl core::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "brand_owner" => Ok(Role::BrandOwner),
            "admin" => Ok(Role::Admin),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}
