use async_trait::async_trait;
use thiserror::Error;

use souk_auth::Account;
use souk_catalog::{Brand, BrandStatus, Product};
use souk_core::{BrandId, Email, PrincipalId, ProductId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness rule was violated (duplicate email, brand already owned, ...).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record to update does not exist.
    #[error("not found")]
    NotFound,

    /// A reference or check rule was violated (e.g. product for a missing brand).
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// A stored record could not be turned back into a domain value.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The backend itself failed (connection, lock poisoning, ...).
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Persisted accounts.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up by normalized email (case-insensitive by construction of [`Email`]).
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Account>, StoreError>;

    /// Insert a new account.
    ///
    /// Fails with [`StoreError::Conflict`] when the email or the owned brand is
    /// already taken, and with [`StoreError::Integrity`] when the owned brand does
    /// not exist.
    async fn create(&self, account: &Account) -> Result<(), StoreError>;
}

/// Persisted brands and products.
///
/// Brand status is only ever written through [`ResourceRepository::write_brand_status`],
/// which the lifecycle manager calls.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn find_brand(&self, id: BrandId) -> Result<Option<Brand>, StoreError>;

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Insert a new brand. Fails with [`StoreError::Conflict`] if the owner already
    /// owns a brand.
    async fn create_brand(&self, brand: &Brand) -> Result<BrandId, StoreError>;

    /// Remove a brand that no account references.
    ///
    /// Returns `false` if it did not exist. Fails with [`StoreError::Integrity`]
    /// while an account still owns it.
    async fn delete_brand(&self, id: BrandId) -> Result<bool, StoreError>;

    /// Compare-and-set on brand status.
    ///
    /// Writes `new` only if the stored status is still `expected`; returns whether
    /// the write happened.
    async fn write_brand_status(
        &self,
        id: BrandId,
        expected: BrandStatus,
        new: BrandStatus,
    ) -> Result<bool, StoreError>;

    /// Persist a brand's profile fields. The stored status is never touched.
    async fn save_brand_profile(&self, brand: &Brand) -> Result<(), StoreError>;

    /// All brands, optionally restricted to one status. Ordered by creation time.
    async fn list_brands(&self, status: Option<BrandStatus>) -> Result<Vec<Brand>, StoreError>;

    /// Insert a product. Fails with [`StoreError::Integrity`] if its brand is missing.
    async fn create_product(&self, product: &Product) -> Result<(), StoreError>;

    async fn save_product(&self, product: &Product) -> Result<(), StoreError>;

    /// Returns `false` if the product did not exist. Favorites pointing at it go too.
    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError>;

    /// Products, optionally of one brand. With `public_only`, products whose brand
    /// is not approved are left out.
    async fn list_products(
        &self,
        brand_id: Option<BrandId>,
        public_only: bool,
    ) -> Result<Vec<Product>, StoreError>;
}

/// Per-client favorite products.
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Idempotent. Fails with [`StoreError::Integrity`] if the product is missing.
    async fn add_favorite(&self, principal: PrincipalId, product: ProductId) -> Result<(), StoreError>;

    async fn remove_favorite(
        &self,
        principal: PrincipalId,
        product: ProductId,
    ) -> Result<bool, StoreError>;

    async fn list_favorites(&self, principal: PrincipalId) -> Result<Vec<ProductId>, StoreError>;
}
