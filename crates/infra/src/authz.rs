//! Authorization entry point.
//!
//! Resolves the target resource's owner with a fresh repository read (only when
//! the policy needs it) and hands the result to the pure evaluator in
//! `souk_auth::authorize`. Nothing is cached between calls, so ownership and ban
//! status are always current.

use std::sync::Arc;

use souk_auth::{
    evaluate, needs_resolution, Action, Decision, PrincipalDescriptor, Resolution, ResourceOwner,
    ResourceRef,
};

use crate::store::{ResourceRepository, StoreError};

#[derive(Clone)]
pub struct Authorizer {
    repo: Arc<dyn ResourceRepository>,
}

impl Authorizer {
    pub fn new(repo: Arc<dyn ResourceRepository>) -> Self {
        Self { repo }
    }

    /// Decide whether `principal` may perform `action` on `resource`.
    ///
    /// Store failures are returned as errors, never as denies.
    pub async fn authorize(
        &self,
        principal: Option<&PrincipalDescriptor>,
        action: Action,
        resource: ResourceRef,
    ) -> Result<Decision, StoreError> {
        let resolution = if needs_resolution(principal, action) {
            self.resolve(resource).await?
        } else {
            Resolution::NotRequired
        };

        let decision = evaluate(principal, action, &resolution);
        if let Decision::Deny(reason) = decision {
            tracing::warn!(
                action = %action,
                principal_id = ?principal.map(|p| p.principal_id),
                role = ?principal.map(|p| p.role),
                resource = ?resource,
                reason = reason.code(),
                "authorization denied"
            );
        }
        Ok(decision)
    }

    async fn resolve(&self, resource: ResourceRef) -> Result<Resolution, StoreError> {
        let brand_id = match resource {
            ResourceRef::None => return Ok(Resolution::Missing),
            ResourceRef::Brand(id) => id,
            ResourceRef::Product(id) => match self.repo.find_product(id).await? {
                Some(product) => product.brand_id(),
                None => return Ok(Resolution::Missing),
            },
        };

        Ok(match self.repo.find_brand(brand_id).await? {
            Some(brand) => Resolution::Found(ResourceOwner {
                brand_id,
                owner_id: brand.owner_id(),
                brand_status: brand.status(),
            }),
            None => Resolution::Missing,
        })
    }
}

impl core::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authorizer").finish_non_exhaustive()
    }
}
