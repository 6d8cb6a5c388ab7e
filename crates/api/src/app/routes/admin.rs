//! Admin routes: the moderation queue and brand status transitions.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use souk_auth::{Action, DenyReason, ResourceRef};
use souk_catalog::BrandStatus;

use crate::app::routes::common::{self, HandlerResult};
use crate::app::{dto, errors, services::AppServices};
use crate::authz::require;
use crate::context::RequestPrincipal;

pub fn router() -> Router {
    Router::new()
        .route("/brands", get(list_brands))
        .route("/brands/:id/status", post(transition_brand))
}

/// GET /admin/brands?status= - every brand, optionally of one status.
pub async fn list_brands(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
    Query(query): Query<dto::ListBrandsQuery>,
) -> HandlerResult {
    require(&services, &principal, Action::ListAllBrands, ResourceRef::None).await?;

    let status = query
        .status
        .as_deref()
        .map(str::parse::<BrandStatus>)
        .transpose()
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()))?;

    let brands = services
        .repo
        .list_brands(status)
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(dto::BrandList::from(brands)).into_response())
}

/// POST /admin/brands/:id/status
pub async fn transition_brand(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
    Path(id): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let brand_id = common::parse_brand_id(&id)?;
    require(
        &services,
        &principal,
        Action::TransitionBrandStatus,
        ResourceRef::Brand(brand_id),
    )
    .await?;
    let body: dto::TransitionRequest = common::parse_body(&body)?;

    let Some(acting) = principal.descriptor() else {
        return Err(errors::deny_to_response(DenyReason::Unauthenticated));
    };

    let brand = services
        .lifecycle
        .transition(brand_id, body.status, acting)
        .await
        .map_err(errors::lifecycle_error_to_response)?;

    Ok(Json(brand).into_response())
}
