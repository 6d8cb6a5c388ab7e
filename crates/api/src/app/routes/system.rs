use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde_json::json;

use souk_auth::DenyReason;

use crate::app::errors;
use crate::app::routes::common::HandlerResult;
use crate::app::services::AppServices;
use crate::context::RequestPrincipal;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /whoami - the caller's account, read fresh from the store.
pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<RequestPrincipal>,
) -> HandlerResult {
    let Some(id) = principal.principal_id() else {
        return Err(errors::deny_to_response(DenyReason::Unauthenticated));
    };

    let account = services
        .accounts
        .find_by_id(id)
        .await
        .map_err(errors::store_error_to_response)?
        // A valid token for an account that no longer resolves.
        .ok_or_else(|| errors::deny_to_response(DenyReason::Unauthenticated))?;

    Ok(Json(json!({
        "principal_id": account.id_typed(),
        "role": account.role(),
        "email": account.email(),
        "display_name": account.display_name(),
        "owned_brand_id": account.owned_brand_id(),
    }))
    .into_response())
}
