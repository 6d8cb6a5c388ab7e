//! Persistence boundary for accounts, brands, products and favorites.
//!
//! Traits live in [`r#trait`]; [`InMemoryStore`] backs dev and tests, [`PgStore`]
//! backs production. Both enforce the same uniqueness and reference rules so the
//! services above behave identically on either.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PgStore;
pub use r#trait::{CredentialStore, FavoriteStore, ResourceRepository, StoreError};
