//! Self-service signup and sign-in.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;

use souk_infra::{Credentials, SignUpProfile};

use crate::app::routes::common::HandlerResult;
use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/signin", post(sign_in))
}

/// POST /auth/signup - register a client or a brand owner with their brand.
///
/// Answers like sign-in, so the new account can act right away.
pub async fn sign_up(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SignUpRequest>,
) -> HandlerResult {
    let Some(kind) = body.parse_kind() else {
        return Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("unknown account kind {:?}", body.kind),
        ));
    };

    let outcome = services
        .provisioning
        .sign_up(
            kind,
            Credentials::new(body.email, body.password),
            SignUpProfile {
                display_name: body.display_name,
                brand: body.brand,
            },
        )
        .await
        .map_err(errors::provisioning_error_to_response)?;

    let token = services
        .tokens
        .issue(&outcome.account, Utc::now())
        .map_err(|e| errors::provisioning_error_to_response(e.into()))?;

    Ok((
        StatusCode::CREATED,
        Json(dto::AuthResponse::new(outcome.account, outcome.brand, token)),
    )
        .into_response())
}

/// POST /auth/signin
pub async fn sign_in(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SignInRequest>,
) -> HandlerResult {
    let outcome = services
        .provisioning
        .sign_in(Credentials::new(body.email, body.password))
        .await
        .map_err(errors::provisioning_error_to_response)?;

    Ok(Json(dto::AuthResponse::new(outcome.account, None, outcome.token)).into_response())
}
