use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use souk_auth::{Action, ResourceRef};
use souk_catalog::ProductUpdate;

use crate::app::routes::common::{self, HandlerResult};
use crate::app::{dto, errors, services::AppServices};
use crate::authz::require;
use crate::context::RequestPrincipal;

pub fn router() -> Router {
    Router::new().route("/", get(list_products)).route(
        "/:id",
        get(get_product).patch(update_product).delete(delete_product),
    )
}

/// GET /products - products of approved brands.
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
) -> HandlerResult {
    require(&services, &principal, Action::ReadCatalog, ResourceRef::None).await?;

    let products = services
        .repo
        .list_products(None, true)
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(dto::ProductList::from(products)).into_response())
}

/// GET /products/:id
pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
    Path(id): Path<String>,
) -> HandlerResult {
    let product_id = common::parse_product_id(&id)?;
    require(&services, &principal, Action::ReadCatalog, ResourceRef::Product(product_id)).await?;

    let product = common::find_visible_product(&services, &principal, product_id)
        .await?
        .ok_or_else(errors::not_found)?;

    Ok(Json(product).into_response())
}

/// PATCH /products/:id
pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
    Path(id): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let product_id = common::parse_product_id(&id)?;
    require(&services, &principal, Action::UpdateProduct, ResourceRef::Product(product_id)).await?;
    let body: ProductUpdate = common::parse_body(&body)?;

    let mut product = services
        .repo
        .find_product(product_id)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(errors::not_found)?;

    product
        .apply_update(body, Utc::now())
        .map_err(errors::domain_error_to_response)?;

    services
        .repo
        .save_product(&product)
        .await
        .map_err(errors::store_error_to_response)?;

    tracing::info!(product_id = %product_id, "product updated");
    Ok(Json(product).into_response())
}

/// DELETE /products/:id
pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
    Path(id): Path<String>,
) -> HandlerResult {
    let product_id = common::parse_product_id(&id)?;
    require(&services, &principal, Action::DeleteProduct, ResourceRef::Product(product_id)).await?;

    let removed = services
        .repo
        .delete_product(product_id)
        .await
        .map_err(errors::store_error_to_response)?;
    if !removed {
        return Err(errors::not_found());
    }

    tracing::info!(product_id = %product_id, "product deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}
