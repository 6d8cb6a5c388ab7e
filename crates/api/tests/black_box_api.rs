use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use souk_api::config::ApiConfig;
use souk_auth::{Role, TokenClaims};
use souk_core::PrincipalId;

const JWT_SECRET: &str = "test-secret";
const ADMIN_EMAIL: &str = "admin@souk.tn";
const ADMIN_PASSWORD: &str = "admin-password";
const PASSWORD: &str = "correct horse";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod (in-memory stores), bound to an ephemeral port.
        let config = ApiConfig::default()
            .with_jwt_secret(JWT_SECRET)
            .with_admin(ADMIN_EMAIL, ADMIN_PASSWORD, "Admin");
        let app = souk_api::app::build_app(config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn sign_up(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/auth/signup"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// Signs up a client and returns its token.
    async fn client_token(&self, email: &str) -> String {
        let res = self
            .sign_up(json!({
                "kind": "client",
                "email": email,
                "password": PASSWORD,
                "display_name": "Client",
            }))
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Signs up a brand owner and returns (token, brand id).
    async fn owner(&self, email: &str, brand: &str) -> (String, String) {
        let res = self
            .sign_up(json!({
                "kind": "brand_owner",
                "email": email,
                "password": PASSWORD,
                "display_name": "Owner",
                "brand": { "name": brand, "category": "fashion" },
            }))
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        (
            body["token"].as_str().unwrap().to_string(),
            body["brand"]["id"].as_str().unwrap().to_string(),
        )
    }

    async fn admin_token(&self) -> String {
        let res = self
            .client
            .post(self.url("/auth/signin"))
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_product(&self, token: &str, brand_id: &str, name: &str) -> String {
        let res = self
            .client
            .post(self.url(&format!("/brands/{brand_id}/products")))
            .bearer_auth(token)
            .json(&json!({
                "name": name,
                "description": "linen",
                "price": 4500,
                "images": ["img/front.jpg", "img/back.jpg"],
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    async fn set_status(&self, token: &str, brand_id: &str, status: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/admin/brands/{brand_id}/status")))
            .bearer_auth(token)
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap()
    }

    async fn favorite_count(&self, token: &str) -> usize {
        let res = self
            .client
            .get(self.url("/me/favorites"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["items"].as_array().unwrap().len()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(role: Role, issued_at: chrono::DateTime<Utc>, ttl: ChronoDuration) -> String {
    let claims = TokenClaims {
        sub: PrincipalId::new(),
        role,
        issued_at,
        expires_at: issued_at + ttl,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn error_code(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn whoami_rejects_missing_garbage_and_expired_tokens() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "invalid_token");

    let expired = mint_jwt(
        Role::Client,
        Utc::now() - ChronoDuration::hours(2),
        ChronoDuration::minutes(10),
    );
    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(expired)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_unknown_principal_is_not_accepted_by_whoami() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(Role::Admin, Utc::now(), ChronoDuration::minutes(10));

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sign_up_sign_in_and_whoami() {
    let srv = TestServer::spawn().await;
    let (token, brand_id) = srv.owner("alice@x.tn", "Alice Wear").await;

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "brand_owner");
    assert_eq!(body["owned_brand_id"], brand_id.as_str());
    assert!(body.get("secret_hash").is_none());

    let res = srv
        .client
        .post(srv.url("/auth/signin"))
        .json(&json!({ "email": "ALICE@x.tn", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .post(srv.url("/auth/signin"))
        .json(&json!({ "email": "alice@x.tn", "password": "wrong password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "invalid_credentials");
}

#[tokio::test]
async fn sign_up_rejects_admin_kind_and_duplicate_email() {
    let srv = TestServer::spawn().await;

    let res = srv
        .sign_up(json!({
            "kind": "admin",
            "email": "mallory@x.tn",
            "password": PASSWORD,
            "display_name": "Mallory",
        }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .sign_up(json!({
            "kind": "brand_owner",
            "email": "nobrand@x.tn",
            "password": PASSWORD,
            "display_name": "No Brand",
        }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    srv.client_token("dup@x.tn").await;
    let res = srv
        .sign_up(json!({
            "kind": "client",
            "email": "Dup@X.tn",
            "password": PASSWORD,
            "display_name": "Again",
        }))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn banned_brand_locks_out_owner_and_cannot_be_reinstated() {
    let srv = TestServer::spawn().await;
    let (alice, brand_id) = srv.owner("alice@x.tn", "Alice Wear").await;
    let product_id = srv.create_product(&alice, &brand_id, "Summer dress").await;
    let admin = srv.admin_token().await;

    let res = srv.set_status(&admin, &brand_id, "banned").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "banned");

    let res = srv
        .client
        .patch(srv.url(&format!("/products/{product_id}")))
        .bearer_auth(&alice)
        .json(&json!({ "name": "Winter dress" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "resource_banned");

    // Hidden from the public, still visible to the owner.
    let res = srv
        .client
        .get(srv.url(&format!("/products/{product_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = srv
        .client
        .get(srv.url(&format!("/products/{product_id}")))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/products")).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());

    let res = srv.set_status(&admin, &brand_id, "approved").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(res).await, "invalid_transition");
}

#[tokio::test]
async fn other_owner_sees_not_found_for_foreign_resources() {
    let srv = TestServer::spawn().await;
    let (alice, alice_brand) = srv.owner("alice@x.tn", "Alice Wear").await;
    let (bob, _) = srv.owner("bob@x.tn", "Bob Denim").await;
    let product_id = srv.create_product(&alice, &alice_brand, "Summer dress").await;

    let res = srv
        .client
        .patch(srv.url(&format!("/products/{product_id}")))
        .bearer_auth(&bob)
        .json(&json!({ "price": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let foreign: Value = res.json().await.unwrap();

    let missing = "0190f5c2-0000-7000-8000-000000000000";
    let res = srv
        .client
        .patch(srv.url(&format!("/products/{missing}")))
        .bearer_auth(&bob)
        .json(&json!({ "price": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let absent: Value = res.json().await.unwrap();
    assert_eq!(foreign, absent);

    let res = srv
        .client
        .patch(srv.url(&format!("/brands/{alice_brand}")))
        .bearer_auth(&bob)
        .json(&json!({ "description": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .delete(srv.url(&format!("/products/{product_id}")))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn brand_profile_update_cannot_carry_a_status() {
    let srv = TestServer::spawn().await;
    let (alice, brand_id) = srv.owner("alice@x.tn", "Alice Wear").await;

    let res = srv
        .client
        .patch(srv.url(&format!("/brands/{brand_id}")))
        .bearer_auth(&alice)
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(res).await, "invalid_body");

    let res = srv
        .client
        .patch(srv.url(&format!("/brands/{brand_id}")))
        .bearer_auth(&alice)
        .json(&json!({ "description": "Handmade in Tunis" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["description"], "Handmade in Tunis");
    assert_eq!(body["status"], "approved");
}

#[tokio::test]
async fn callers_are_authorized_before_their_body_is_read() {
    let srv = TestServer::spawn().await;
    let (_alice, brand_id) = srv.owner("alice@x.tn", "Alice Wear").await;
    let (bob, _) = srv.owner("bob@x.tn", "Bob Shoes").await;
    let carol = srv.client_token("carol@x.tn").await;
    let bad = json!({ "status": "banned" });
    let path = format!("/brands/{brand_id}");

    let res = srv.client.patch(srv.url(&path)).json(&bad).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "unauthenticated");

    let res = srv
        .client
        .patch(srv.url(&path))
        .bearer_auth(&carol)
        .json(&bad)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .patch(srv.url(&path))
        .bearer_auth(&bob)
        .json(&bad)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .post(srv.url(&format!("{path}/products")))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .post(srv.url("/me/favorites"))
        .json(&json!({ "nope": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_are_admin_only() {
    let srv = TestServer::spawn().await;
    let client = srv.client_token("carol@x.tn").await;
    let (owner, brand_id) = srv.owner("alice@x.tn", "Alice Wear").await;

    for token in [&client, &owner] {
        let res = srv
            .client
            .get(srv.url("/admin/brands"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = srv.set_status(token, &brand_id, "banned").await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    let res = srv
        .client
        .get(srv.url("/admin/brands"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let admin = srv.admin_token().await;
    let res = srv
        .client
        .get(srv.url("/admin/brands?status=approved"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn favorites_are_client_only_and_follow_visibility() {
    let srv = TestServer::spawn().await;
    let client = srv.client_token("carol@x.tn").await;
    let (owner, brand_id) = srv.owner("alice@x.tn", "Alice Wear").await;
    let product_id = srv.create_product(&owner, &brand_id, "Summer dress").await;

    let res = srv
        .client
        .post(srv.url("/me/favorites"))
        .bearer_auth(&owner)
        .json(&json!({ "product_id": product_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .post(srv.url("/me/favorites"))
        .bearer_auth(&client)
        .json(&json!({ "product_id": product_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    assert_eq!(srv.favorite_count(&client).await, 1);

    let admin = srv.admin_token().await;
    assert_eq!(
        srv.set_status(&admin, &brand_id, "banned").await.status(),
        StatusCode::OK
    );
    assert_eq!(srv.favorite_count(&client).await, 0);

    let res = srv
        .client
        .delete(srv.url(&format!("/me/favorites/{product_id}")))
        .bearer_auth(&client)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv
        .client
        .delete(srv.url(&format!("/me/favorites/{product_id}")))
        .bearer_auth(&client)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .get(srv.url("/brands/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "invalid_id");
}
