//! Brand directory and per-brand product listings.

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
use souk_catalog::{BrandProfileUpdate, BrandStatus, NewProduct, Product};
use souk_core::ProductId;

use crate::app::routes::common::{self, HandlerResult};
use crate::app::{dto, errors, services::AppServices};
use crate::authz::require;
use crate::context::RequestPrincipal;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_brands))
        .route("/:id", get(get_brand).patch(update_brand))
        .route("/:id/products", get(list_brand_products).post(create_product))
}

/// GET /brands - approved brands only.
pub async fn list_brands(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
) -> HandlerResult {
    require(&services, &principal, Action::ReadCatalog, ResourceRef::None).await?;

    let brands = services
        .repo
        .list_brands(Some(BrandStatus::Approved))
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(dto::BrandList::from(brands)).into_response())
}

/// GET /brands/:id
pub async fn get_brand(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
    Path(id): Path<String>,
) -> HandlerResult {
    let brand_id = common::parse_brand_id(&id)?;
    require(&services, &principal, Action::ReadCatalog, ResourceRef::Brand(brand_id)).await?;

    let brand = common::find_visible_brand(&services, &principal, brand_id)
        .await?
        .ok_or_else(errors::not_found)?;

    Ok(Json(brand).into_response())
}

/// PATCH /brands/:id - owner edits the brand profile. Status is not part of
/// the payload; unknown fields are rejected.
pub async fn update_brand(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
    Path(id): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let brand_id = common::parse_brand_id(&id)?;
    require(
        &services,
        &principal,
        Action::UpdateBrandProfile,
        ResourceRef::Brand(brand_id),
    )
    .await?;
    let body: BrandProfileUpdate = common::parse_body(&body)?;

    if body.is_empty() {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "update contains no fields",
        ));
    }

    let mut brand = services
        .repo
        .find_brand(brand_id)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(errors::not_found)?;

    brand
        .apply_profile_update(body, Utc::now())
        .map_err(errors::domain_error_to_response)?;

    services
        .repo
        .save_brand_profile(&brand)
        .await
        .map_err(errors::store_error_to_response)?;

    tracing::info!(brand_id = %brand_id, "brand profile updated");
    Ok(Json(brand).into_response())
}

/// GET /brands/:id/products
pub async fn list_brand_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
    Path(id): Path<String>,
) -> HandlerResult {
    let brand_id = common::parse_brand_id(&id)?;
    require(&services, &principal, Action::ReadCatalog, ResourceRef::Brand(brand_id)).await?;

    // Hidden brands answer 404 rather than an empty list.
    common::find_visible_brand(&services, &principal, brand_id)
        .await?
        .ok_or_else(errors::not_found)?;

    let products = services
        .repo
        .list_products(Some(brand_id), false)
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(dto::ProductList::from(products)).into_response())
}

/// POST /brands/:id/products - owner (or admin) lists a new product.
pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
    Path(id): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let brand_id = common::parse_brand_id(&id)?;
    require(&services, &principal, Action::CreateProduct, ResourceRef::Brand(brand_id)).await?;
    let body: NewProduct = common::parse_body(&body)?;

    let product = Product::create(ProductId::new(), brand_id, body, Utc::now())
        .map_err(errors::domain_error_to_response)?;

    services
        .repo
        .create_product(&product)
        .await
        .map_err(errors::store_error_to_response)?;

    tracing::info!(
        brand_id = %brand_id,
        product_id = %product.id_typed(),
        "product created"
    );
    Ok((StatusCode::CREATED, Json(product)).into_response())
}
