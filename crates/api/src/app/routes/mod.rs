use axum::{Router, routing::get};

pub mod admin;
pub mod auth;
pub mod brands;
pub mod common;
pub mod favorites;
pub mod products;
pub mod system;

/// Router for every endpoint behind the auth middleware.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/auth", auth::router())
        .nest("/brands", brands::router())
        .nest("/products", products::router())
        .nest("/me/favorites", favorites::router())
        .nest("/admin", admin::router())
}
