//! API-side authorization guard.
//!
//! Every protected handler calls [`require`] before touching a store. The
//! decision itself comes from `souk_infra::Authorizer`; this module only maps
//! it to a response.

use axum::response::Response;

use souk_auth::{Action, Decision, PrincipalDescriptor, ResourceRef};
use souk_catalog::Brand;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::RequestPrincipal;

/// Allow the request through, or produce the error response for the denial.
pub async fn require(
    services: &AppServices,
    principal: &RequestPrincipal,
    action: Action,
    resource: ResourceRef,
) -> Result<(), Response> {
    match services
        .authorizer
        .authorize(principal.descriptor(), action, resource)
        .await
    {
        Ok(Decision::Allow) => Ok(()),
        Ok(Decision::Deny(reason)) => Err(errors::deny_to_response(reason)),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}

/// Whether a brand (and its products) may be shown to this caller.
///
/// Approved brands are public; other statuses are visible to the owner and to
/// admins only.
pub fn brand_visible_to(brand: &Brand, principal: Option<&PrincipalDescriptor>) -> bool {
    brand.status().is_public()
        || principal.is_some_and(|p| p.is_admin() || brand.is_owned_by(p.principal_id))
}
