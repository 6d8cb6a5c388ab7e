use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use souk_auth::DenyReason;
use souk_core::DomainError;
use souk_infra::{LifecycleError, ProvisioningError, StoreError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Denials that concern someone else's resource answer exactly like a missing
/// one, so ids of other brands' resources cannot be probed.
pub fn deny_to_response(reason: DenyReason) -> axum::response::Response {
    match reason {
        DenyReason::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, reason.code(), reason.to_string())
        }
        DenyReason::WrongRole | DenyReason::ResourceBanned => {
            json_error(StatusCode::FORBIDDEN, reason.code(), reason.to_string())
        }
        DenyReason::NotOwner | DenyReason::ResourceNotFound => not_found(),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::NotFound => not_found(),
        StoreError::Integrity(msg) => {
            json_error(StatusCode::CONFLICT, "integrity_violation", msg)
        }
        StoreError::Corrupt(_) | StoreError::Backend(_) => {
            tracing::error!(error = %err, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal store error")
        }
    }
}

pub fn lifecycle_error_to_response(err: LifecycleError) -> axum::response::Response {
    match err {
        LifecycleError::Forbidden => json_error(StatusCode::FORBIDDEN, "wrong_role", err.to_string()),
        LifecycleError::NotFound => not_found(),
        LifecycleError::InvalidTransition { .. } => {
            json_error(StatusCode::CONFLICT, "invalid_transition", err.to_string())
        }
        LifecycleError::Store(e) => store_error_to_response(e),
    }
}

pub fn provisioning_error_to_response(err: ProvisioningError) -> axum::response::Response {
    match err {
        ProvisioningError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        ProvisioningError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        ProvisioningError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            err.to_string(),
        ),
        ProvisioningError::Store(e) => store_error_to_response(e),
        ProvisioningError::Token(_) | ProvisioningError::Internal(_) => {
            tracing::error!(error = %err, "provisioning failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    if !err.is_caller_fault() {
        tracing::error!(error = %err, "stored record failed validation");
        return json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "internal error",
        );
    }
    json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
}

pub fn invalid_id(what: &str) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id"))
}

pub fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}
