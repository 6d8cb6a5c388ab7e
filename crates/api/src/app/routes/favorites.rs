//! A client's favorite products.
//!
//! Favorites of products whose brand has since left the public directory stay
//! stored but are not listed.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};

use souk_auth::{Action, DenyReason, ResourceRef};
use souk_core::PrincipalId;

use crate::app::routes::common::{self, HandlerResult};
use crate::app::{dto, errors, services::AppServices};
use crate::authz::require;
use crate::context::RequestPrincipal;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/:product_id", delete(remove_favorite))
}

async fn client_id(
    services: &AppServices,
    principal: &RequestPrincipal,
) -> Result<PrincipalId, axum::response::Response> {
    require(services, principal, Action::ManageFavorites, ResourceRef::None).await?;
    principal
        .principal_id()
        .ok_or_else(|| errors::deny_to_response(DenyReason::Unauthenticated))
}

/// GET /me/favorites
pub async fn list_favorites(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
) -> HandlerResult {
    let client = client_id(&services, &principal).await?;

    let ids = services
        .favorites
        .list_favorites(client)
        .await
        .map_err(errors::store_error_to_response)?;

    let mut products = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(product) = common::find_visible_product(&services, &principal, id).await? {
            products.push(product);
        }
    }

    Ok(Json(dto::ProductList::from(products)).into_response())
}

/// POST /me/favorites - only publicly visible products can be added.
pub async fn add_favorite(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
    body: Bytes,
) -> HandlerResult {
    let client = client_id(&services, &principal).await?;
    let body: dto::AddFavoriteRequest = common::parse_body(&body)?;
    let product_id = common::parse_product_id(&body.product_id)?;

    common::find_visible_product(&services, &principal, product_id)
        .await?
        .ok_or_else(errors::not_found)?;

    services
        .favorites
        .add_favorite(client, product_id)
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /me/favorites/:product_id
pub async fn remove_favorite(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
    Path(product_id): Path<String>,
) -> HandlerResult {
    let client = client_id(&services, &principal).await?;
    let product_id = common::parse_product_id(&product_id)?;

    let removed = services
        .favorites
        .remove_favorite(client, product_id)
        .await
        .map_err(errors::store_error_to_response)?;
    if !removed {
        return Err(errors::not_found());
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}
