use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use souk_auth::TokenCodec;

use crate::app::errors;
use crate::context::RequestPrincipal;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenCodec>,
}

/// Attach a [`RequestPrincipal`] to every request.
///
/// No `Authorization` header: anonymous. A header that is not a valid, unexpired
/// bearer token: 401 before any handler runs.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let principal = match extract_bearer(req.headers()) {
        Ok(None) => RequestPrincipal::anonymous(),
        Ok(Some(token)) => match state.tokens.verify(token, Utc::now()) {
            Ok(descriptor) => RequestPrincipal::authenticated(descriptor),
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                return errors::json_error(StatusCode::UNAUTHORIZED, "invalid_token", e.to_string());
            }
        },
        Err(status) => {
            return errors::json_error(status, "invalid_token", "malformed Authorization header");
        }
    };

    req.extensions_mut().insert(principal);
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, StatusCode> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(extract_bearer(&headers), Ok(Some("abc.def.ghi")));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_rejected() {
        for value in ["Basic dXNlcjpwYXNz", "Bearer ", "abc.def.ghi"] {
            let mut headers = HeaderMap::new();
            headers.insert(
                axum::http::header::AUTHORIZATION,
                HeaderValue::from_static(value),
            );
            assert_eq!(extract_bearer(&headers), Err(StatusCode::UNAUTHORIZED));
        }
    }
}
