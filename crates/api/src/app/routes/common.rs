use axum::{body::Bytes, http::StatusCode, response::Response};
use serde::de::DeserializeOwned;

use souk_catalog::{Brand, Product};
use souk_core::{BrandId, ProductId};

use crate::app::{errors, services::AppServices};
use crate::authz::brand_visible_to;
use crate::context::RequestPrincipal;

/// Handlers answer with a response either way; `Err` short-circuits with `?`.
pub type HandlerResult = Result<Response, Response>;

/// Decode a JSON request body. Protected handlers call this after `require`.
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|e| {
        errors::json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_body", e.to_string())
    })
}

pub fn parse_brand_id(raw: &str) -> Result<BrandId, Response> {
    raw.parse().map_err(|_| errors::invalid_id("brand"))
}

pub fn parse_product_id(raw: &str) -> Result<ProductId, Response> {
    raw.parse().map_err(|_| errors::invalid_id("product"))
}

/// The brand, if it exists and the caller may see it.
pub async fn find_visible_brand(
    services: &AppServices,
    principal: &RequestPrincipal,
    id: BrandId,
) -> Result<Option<Brand>, Response> {
    let brand = services
        .repo
        .find_brand(id)
        .await
        .map_err(errors::store_error_to_response)?;
    Ok(brand.filter(|b| brand_visible_to(b, principal.descriptor())))
}

/// The product, if it exists and its brand is visible to the caller.
pub async fn find_visible_product(
    services: &AppServices,
    principal: &RequestPrincipal,
    id: ProductId,
) -> Result<Option<Product>, Response> {
    let Some(product) = services
        .repo
        .find_product(id)
        .await
        .map_err(errors::store_error_to_response)?
    else {
        return Ok(None);
    };

    let visible = find_visible_brand(services, principal, product.brand_id())
        .await?
        .is_some();
    Ok(visible.then_some(product))
}
