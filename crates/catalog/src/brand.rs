use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use souk_core::{BrandId, DomainError, DomainResult, Entity, PrincipalId};

/// Maximum length of a brand name.
pub const MAX_NAME_LEN: usize = 120;

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Publication status of a brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrandStatus {
    /// Waiting in the moderation queue.
    Pending,
    /// Live in the public catalog.
    Approved,
    /// Refused by moderation. Terminal.
    Rejected,
    /// Taken down by an admin. Terminal, no self-service reactivation.
    Banned,
}

impl BrandStatus {
    pub const ALL: [BrandStatus; 4] = [
        BrandStatus::Pending,
        BrandStatus::Approved,
        BrandStatus::Rejected,
        BrandStatus::Banned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrandStatus::Pending => "pending",
            BrandStatus::Approved => "approved",
            BrandStatus::Rejected => "rejected",
            BrandStatus::Banned => "banned",
        }
    }

    /// Statuses reachable from `self` in a single admin transition.
    pub fn allowed_targets(self) -> &'static [BrandStatus] {
        match self {
            BrandStatus::Pending => &[BrandStatus::Approved, BrandStatus::Rejected],
            BrandStatus::Approved => &[BrandStatus::Banned],
            BrandStatus::Rejected | BrandStatus::Banned => &[],
        }
    }

    /// Whether the edge `self -> target` exists. There are no self-edges.
    pub fn can_transition_to(self, target: BrandStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }

    /// Only approved brands (and their products) appear in public reads.
    pub fn is_public(self) -> bool {
        self == BrandStatus::Approved
    }
}

impl core::fmt::Display for BrandStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown brand status '{0}'")]
pub struct ParseBrandStatusError(pub String);

impl core::str::FromStr for BrandStatus {
    type Err = ParseBrandStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BrandStatus::Pending),
            "approved" => Ok(BrandStatus::Approved),
            "rejected" => Ok(BrandStatus::Rejected),
            "banned" => Ok(BrandStatus::Banned),
            other => Err(ParseBrandStatusError(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub website: Option<String>,
}

/// Descriptive, owner-editable fields of a brand. Never carries a status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandProfile {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub social: SocialLinks,
    /// Reference to an already-uploaded logo image.
    pub logo: Option<String>,
}

impl BrandProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("brand name cannot be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation(format!(
                "brand name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        Ok(())
    }

    fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

/// Partial profile update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrandProfileUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub social: Option<SocialLinks>,
    pub logo: Option<String>,
}

impl BrandProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Brand
// ─────────────────────────────────────────────────────────────────────────────

/// A brand listed in the directory.
///
/// # Invariants
/// - `owner_id` names the single account whose `owned_brand_id` is this brand.
/// - `status` only moves along the edges of [`BrandStatus::allowed_targets`];
///   profile updates never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Brand {
    id: BrandId,
    owner_id: PrincipalId,
    status: BrandStatus,
    #[serde(flatten)]
    profile: BrandProfile,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Brand {
    /// Build a new brand bound to `owner_id`.
    pub fn create(
        id: BrandId,
        owner_id: PrincipalId,
        profile: BrandProfile,
        initial_status: BrandStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        profile.validate()?;
        Ok(Self {
            id,
            owner_id,
            status: initial_status,
            profile: profile.normalized(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrate a brand from storage. No validation is performed.
    pub fn restore(
        id: BrandId,
        owner_id: PrincipalId,
        status: BrandStatus,
        profile: BrandProfile,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            status,
            profile,
            created_at,
            updated_at,
        }
    }

    pub fn id_typed(&self) -> BrandId {
        self.id
    }

    pub fn owner_id(&self) -> PrincipalId {
        self.owner_id
    }

    pub fn status(&self) -> BrandStatus {
        self.status
    }

    pub fn profile(&self) -> &BrandProfile {
        &self.profile
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_owned_by(&self, principal_id: PrincipalId) -> bool {
        self.owner_id == principal_id
    }

    /// Apply an owner-submitted profile update, validating the result.
    pub fn apply_profile_update(
        &mut self,
        update: BrandProfileUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut next = self.profile.clone();
        if let Some(name) = update.name {
            next.name = name;
        }
        if let Some(category) = update.category {
            next.category = Some(category);
        }
        if let Some(description) = update.description {
            next.description = Some(description);
        }
        if let Some(email) = update.contact_email {
            next.contact_email = Some(email);
        }
        if let Some(phone) = update.contact_phone {
            next.contact_phone = Some(phone);
        }
        if let Some(social) = update.social {
            next.social = social;
        }
        if let Some(logo) = update.logo {
            next.logo = Some(logo);
        }
        next.validate()?;

        self.profile = next.normalized();
        self.updated_at = now;
        Ok(())
    }

    /// Returns the brand with `status` replaced.
    ///
    /// Only repositories call this, while applying a status compare-and-set that
    /// the lifecycle manager already validated against the edge table.
    pub fn with_status(mut self, status: BrandStatus, now: DateTime<Utc>) -> Self {
        self.status = status;
        self.updated_at = now;
        self
    }
}

impl Entity for Brand {
    type Id = BrandId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
