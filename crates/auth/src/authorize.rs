//! Access policy: one evaluator for every protected action.
//!
//! Evaluation is split in two so that this module stays pure:
//! 1. [`needs_resolution`] tells the caller whether the decision depends on who
//!    owns the target resource;
//! 2. the caller performs a fresh repository read and passes the outcome to
//!    [`evaluate`] as a [`Resolution`].
//!
//! `souk-infra::authz::Authorizer` wires the two steps together.

use serde::Serialize;
use thiserror::Error;

use souk_catalog::BrandStatus;
use souk_core::{BrandId, PrincipalId, ProductId};

use crate::{PrincipalDescriptor, Role};

// ─────────────────────────────────────────────────────────────────────────────
// Actions
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a route can ask permission for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Browse brands and products.
    ReadCatalog,
    /// Back-office listing of brands in any status.
    ListAllBrands,
    /// Move a brand along its lifecycle.
    TransitionBrandStatus,
    /// Edit a brand's descriptive fields.
    UpdateBrandProfile,
    /// List a product under a brand (the resource is the brand).
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    /// Add or remove products from the caller's favorites.
    ManageFavorites,
}

/// Policy class of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPolicy {
    PublicRead,
    AdminOnly,
    /// Mutation of a brand-scoped resource by its owner. With `admin_override`,
    /// admins may perform it on any brand.
    OwnerMutation { admin_override: bool },
    ClientOnly,
}

impl Action {
    pub fn policy(self) -> ActionPolicy {
        match self {
            Action::ReadCatalog => ActionPolicy::PublicRead,
            Action::ListAllBrands | Action::TransitionBrandStatus => ActionPolicy::AdminOnly,
            Action::UpdateBrandProfile => ActionPolicy::OwnerMutation {
                admin_override: false,
            },
            Action::CreateProduct | Action::UpdateProduct | Action::DeleteProduct => {
                ActionPolicy::OwnerMutation {
                    admin_override: true,
                }
            }
            Action::ManageFavorites => ActionPolicy::ClientOnly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ReadCatalog => "read_catalog",
            Action::ListAllBrands => "list_all_brands",
            Action::TransitionBrandStatus => "transition_brand_status",
            Action::UpdateBrandProfile => "update_brand_profile",
            Action::CreateProduct => "create_product",
            Action::UpdateProduct => "update_product",
            Action::DeleteProduct => "delete_product",
            Action::ManageFavorites => "manage_favorites",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resources and resolution
// ─────────────────────────────────────────────────────────────────────────────

/// The target of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    /// Actions without a specific target (listings, favorites).
    None,
    Brand(BrandId),
    Product(ProductId),
}

/// Ownership facts about a resource, freshly read from the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceOwner {
    /// The brand the resource belongs to (the brand itself for brands).
    pub brand_id: BrandId,
    pub owner_id: PrincipalId,
    pub brand_status: BrandStatus,
}

/// Outcome of resolving a resource's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The decision does not depend on ownership; nothing was read.
    NotRequired,
    Found(ResourceOwner),
    Missing,
}

// ─────────────────────────────────────────────────────────────────────────────
// Decisions
// ─────────────────────────────────────────────────────────────────────────────

/// Why an action was denied. Distinct enough for the boundary layer to choose a
/// response without re-deriving policy.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    #[error("authentication required")]
    Unauthenticated,

    #[error("role not permitted for this action")]
    WrongRole,

    #[error("resource belongs to another brand")]
    NotOwner,

    #[error("brand is banned")]
    ResourceBanned,

    #[error("resource not found")]
    ResourceNotFound,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::WrongRole => "wrong_role",
            DenyReason::NotOwner => "not_owner",
            DenyReason::ResourceBanned => "resource_banned",
            DenyReason::ResourceNotFound => "resource_not_found",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────────────────

fn may_attempt_owner_mutation(role: Role, admin_override: bool) -> bool {
    match role {
        Role::BrandOwner => true,
        Role::Admin => admin_override,
        Role::Client => false,
    }
}

/// Whether [`evaluate`] needs the resource's owner for this caller and action.
///
/// False whenever the decision is already determined by authentication or role,
/// so callers with the wrong role never trigger a lookup (and cannot probe for
/// existence).
pub fn needs_resolution(principal: Option<&PrincipalDescriptor>, action: Action) -> bool {
    match (principal, action.policy()) {
        (Some(p), ActionPolicy::OwnerMutation { admin_override }) => {
            may_attempt_owner_mutation(p.role, admin_override)
        }
        _ => false,
    }
}

/// Evaluate the policy. First matching rule wins:
///
/// 1. anonymous callers may only perform public reads;
/// 2. public reads are allowed;
/// 3. admin-only actions require the admin role;
/// 4. owner mutations require the owning brand owner (or an admin where the
///    action allows an override), an existing resource, and a brand that is not
///    banned;
/// 5. client-only actions require the client role.
///
/// - No IO
/// - No panics
pub fn evaluate(
    principal: Option<&PrincipalDescriptor>,
    action: Action,
    resolution: &Resolution,
) -> Decision {
    let policy = action.policy();

    let Some(principal) = principal else {
        return match policy {
            ActionPolicy::PublicRead => Decision::Allow,
            _ => Decision::Deny(DenyReason::Unauthenticated),
        };
    };

    match policy {
        ActionPolicy::PublicRead => Decision::Allow,

        ActionPolicy::AdminOnly => {
            if principal.role == Role::Admin {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::WrongRole)
            }
        }

        ActionPolicy::OwnerMutation { admin_override } => {
            if !may_attempt_owner_mutation(principal.role, admin_override) {
                return Decision::Deny(DenyReason::WrongRole);
            }
            let owner = match resolution {
                Resolution::Found(owner) => owner,
                Resolution::Missing | Resolution::NotRequired => {
                    return Decision::Deny(DenyReason::ResourceNotFound);
                }
            };
            if principal.role == Role::Admin {
                return Decision::Allow;
            }
            if owner.owner_id != principal.principal_id {
                return Decision::Deny(DenyReason::NotOwner);
            }
            if owner.brand_status == BrandStatus::Banned {
                return Decision::Deny(DenyReason::ResourceBanned);
            }
            Decision::Allow
        }

        ActionPolicy::ClientOnly => {
            if principal.role == Role::Client {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::WrongRole)
            }
        }
    }
}
