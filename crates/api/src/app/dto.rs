use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use souk_auth::{Account, IssuedToken};
use souk_catalog::{Brand, BrandProfile, BrandStatus, Product};
use souk_infra::SignUpKind;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    /// `client` or `brand_owner`. Admin accounts cannot be created here.
    pub kind: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
    #[serde(default)]
    pub brand: Option<BrandProfile>,
}

impl SignUpRequest {
    pub fn parse_kind(&self) -> Option<SignUpKind> {
        match self.kind.trim() {
            "client" => Some(SignUpKind::Client),
            "brand_owner" => Some(SignUpKind::BrandOwner),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: BrandStatus,
}

#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub product_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListBrandsQuery {
    pub status: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub account: Account,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<Brand>,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthResponse {
    pub fn new(account: Account, brand: Option<Brand>, token: IssuedToken) -> Self {
        Self {
            account,
            brand,
            token: token.token,
            expires_at: token.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

pub type BrandList = ListResponse<Brand>;
pub type ProductList = ListResponse<Product>;

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: &str) -> SignUpRequest {
        serde_json::from_value(serde_json::json!({
            "kind": kind,
            "email": "alice@x.tn",
            "password": "correct horse",
            "display_name": "Alice",
        }))
        .unwrap()
    }

    #[test]
    fn only_self_service_kinds_parse() {
        assert_eq!(request("client").parse_kind(), Some(SignUpKind::Client));
        assert_eq!(request("brand_owner").parse_kind(), Some(SignUpKind::BrandOwner));
        assert_eq!(request("admin").parse_kind(), None);
    }

    #[test]
    fn transition_request_uses_lowercase_status() {
        let req: TransitionRequest =
            serde_json::from_value(serde_json::json!({"status": "banned"})).unwrap();
        assert_eq!(req.status, BrandStatus::Banned);
    }
}
