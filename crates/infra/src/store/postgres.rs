//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | StoreError | Scenario |
//! |-----------------------|------------|----------|
//! | `23505` | `Conflict` | duplicate email, second brand for an owner, brand owned twice |
//! | `23503` | `Integrity` | product for a missing brand, deleting a still-owned brand |
//! | `23514` | `Integrity` | role / owned brand mismatch, unknown status |
//! | other / pool / io | `Backend` | |
//!
//! ## Invariants enforced by the schema
//!
//! - `accounts.email` and `accounts.owned_brand_id` are unique, and
//!   `owned_brand_id IS NOT NULL` exactly when `role = 'brand_owner'`.
//! - `brands.owner_id` is unique.
//! - Brand status changes are a single conditional `UPDATE`, so concurrent
//!   transitions from the same status cannot both succeed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use souk_auth::{Account, Role, SecretHash};
use souk_catalog::{Brand, BrandProfile, BrandStatus, Product, SocialLinks};
use souk_core::{BrandId, Email, Price, PrincipalId, ProductId};

use super::r#trait::{CredentialStore, FavoriteStore, ResourceRepository, StoreError};

/// Schema, applied statement by statement by [`PgStore::migrate`].
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS brands (
        id            UUID PRIMARY KEY,
        owner_id      UUID NOT NULL UNIQUE,
        status        TEXT NOT NULL CHECK (status IN ('pending', 'approved', 'rejected', 'banned')),
        name          TEXT NOT NULL,
        category      TEXT NULL,
        description   TEXT NULL,
        contact_email TEXT NULL,
        contact_phone TEXT NULL,
        social        JSONB NOT NULL DEFAULT '{}'::jsonb,
        logo          TEXT NULL,
        created_at    TIMESTAMPTZ NOT NULL,
        updated_at    TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id             UUID PRIMARY KEY,
        email          TEXT NOT NULL UNIQUE,
        secret_hash    TEXT NOT NULL,
        role           TEXT NOT NULL CHECK (role IN ('client', 'brand_owner', 'admin')),
        owned_brand_id UUID NULL UNIQUE REFERENCES brands (id),
        display_name   TEXT NOT NULL,
        created_at     TIMESTAMPTZ NOT NULL,
        CHECK ((role = 'brand_owner') = (owned_brand_id IS NOT NULL))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          UUID PRIMARY KEY,
        brand_id    UUID NOT NULL REFERENCES brands (id) ON DELETE CASCADE,
        name        TEXT NOT NULL,
        description TEXT NULL,
        price       BIGINT NOT NULL CHECK (price >= 0),
        images      JSONB NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS products_brand_id_idx ON products (brand_id)",
    r#"
    CREATE TABLE IF NOT EXISTS favorites (
        principal_id UUID NOT NULL REFERENCES accounts (id) ON DELETE CASCADE,
        product_id   UUID NOT NULL REFERENCES products (id) ON DELETE CASCADE,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (principal_id, product_id)
    )
    "#,
];

const BRAND_COLUMNS: &str = "id, owner_id, status, name, category, description, contact_email, \
                             contact_phone, social, logo, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
    "id, brand_id, name, description, price, images, created_at, updated_at";
const ACCOUNT_COLUMNS: &str =
    "id, email, secret_hash, role, owned_brand_id, display_name, created_at";

/// Postgres-backed implementation of every store trait.
///
/// Uses the SQLx connection pool, which is `Send + Sync`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_email", e))?;

        row.map(|r| Account::try_from(decode::<AccountRow>(&r)?))
            .transpose()
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_account", e))?;

        row.map(|r| Account::try_from(decode::<AccountRow>(&r)?))
            .transpose()
    }

    #[instrument(skip(self, account), fields(principal_id = %account.id_typed(), role = %account.role()), err)]
    async fn create(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, secret_hash, role, owned_brand_id, display_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id_typed().as_uuid())
        .bind(account.email().as_str())
        .bind(account.secret_hash().as_phc())
        .bind(account.role().as_str())
        .bind(account.owned_brand_id().map(|b| *b.as_uuid()))
        .bind(account.display_name())
        .bind(account.created_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_account", e))?;
        Ok(())
    }
}

#[async_trait]
impl ResourceRepository for PgStore {
    async fn find_brand(&self, id: BrandId) -> Result<Option<Brand>, StoreError> {
        let row = sqlx::query(&format!("SELECT {BRAND_COLUMNS} FROM brands WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_brand", e))?;

        row.map(|r| Brand::try_from(decode::<BrandRow>(&r)?))
            .transpose()
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product", e))?;

        row.map(|r| Product::try_from(decode::<ProductRow>(&r)?))
            .transpose()
    }

    #[instrument(skip(self, brand), fields(brand_id = %brand.id_typed()), err)]
    async fn create_brand(&self, brand: &Brand) -> Result<BrandId, StoreError> {
        let profile = brand.profile();
        sqlx::query(
            r#"
            INSERT INTO brands (
                id, owner_id, status, name, category, description,
                contact_email, contact_phone, social, logo, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(brand.id_typed().as_uuid())
        .bind(brand.owner_id().as_uuid())
        .bind(brand.status().as_str())
        .bind(&profile.name)
        .bind(&profile.category)
        .bind(&profile.description)
        .bind(&profile.contact_email)
        .bind(&profile.contact_phone)
        .bind(Json(&profile.social))
        .bind(&profile.logo)
        .bind(brand.created_at())
        .bind(brand.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_brand", e))?;
        Ok(brand.id_typed())
    }

    #[instrument(skip(self), fields(brand_id = %id), err)]
    async fn delete_brand(&self, id: BrandId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM brands WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_brand", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(brand_id = %id, from = %expected, to = %new), err)]
    async fn write_brand_status(
        &self,
        id: BrandId,
        expected: BrandStatus,
        new: BrandStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE brands SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
        )
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .bind(new.as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("write_brand_status", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn save_brand_profile(&self, brand: &Brand) -> Result<(), StoreError> {
        let profile = brand.profile();
        let result = sqlx::query(
            r#"
            UPDATE brands SET
                name = $2,
                category = $3,
                description = $4,
                contact_email = $5,
                contact_phone = $6,
                social = $7,
                logo = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(brand.id_typed().as_uuid())
        .bind(&profile.name)
        .bind(&profile.category)
        .bind(&profile.description)
        .bind(&profile.contact_email)
        .bind(&profile.contact_phone)
        .bind(Json(&profile.social))
        .bind(&profile.logo)
        .bind(brand.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_brand_profile", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_brands(&self, status: Option<BrandStatus>) -> Result<Vec<Brand>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BRAND_COLUMNS} FROM brands
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_brands", e))?;

        rows.iter()
            .map(|r| Brand::try_from(decode::<BrandRow>(r)?))
            .collect()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id_typed(), brand_id = %product.brand_id()), err)]
    async fn create_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, brand_id, name, description, price, images, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id_typed().as_uuid())
        .bind(product.brand_id().as_uuid())
        .bind(product.name())
        .bind(product.description())
        .bind(price_to_column(product.price())?)
        .bind(Json(product.images()))
        .bind(product.created_at())
        .bind(product.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;
        Ok(())
    }

    async fn save_product(&self, product: &Product) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = $2,
                description = $3,
                price = $4,
                images = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id_typed().as_uuid())
        .bind(product.name())
        .bind(product.description())
        .bind(price_to_column(product.price())?)
        .bind(Json(product.images()))
        .bind(product.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_products(
        &self,
        brand_id: Option<BrandId>,
        public_only: bool,
    ) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.brand_id, p.name, p.description, p.price, p.images, p.created_at, p.updated_at
            FROM products p
            JOIN brands b ON b.id = p.brand_id
            WHERE ($1::UUID IS NULL OR p.brand_id = $1)
              AND (NOT $2 OR b.status = 'approved')
            ORDER BY p.created_at ASC, p.id ASC
            "#,
        )
        .bind(brand_id.map(|b| *b.as_uuid()))
        .bind(public_only)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter()
            .map(|r| Product::try_from(decode::<ProductRow>(r)?))
            .collect()
    }
}

#[async_trait]
impl FavoriteStore for PgStore {
    async fn add_favorite(&self, principal: PrincipalId, product: ProductId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO favorites (principal_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (principal_id, product_id) DO NOTHING
            "#,
        )
        .bind(principal.as_uuid())
        .bind(product.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_favorite", e))?;
        Ok(())
    }

    async fn remove_favorite(
        &self,
        principal: PrincipalId,
        product: ProductId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM favorites WHERE principal_id = $1 AND product_id = $2")
            .bind(principal.as_uuid())
            .bind(product.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_favorite", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_favorites(&self, principal: PrincipalId) -> Result<Vec<ProductId>, StoreError> {
        let rows = sqlx::query(
            "SELECT product_id FROM favorites WHERE principal_id = $1 ORDER BY created_at ASC",
        )
        .bind(principal.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_favorites", e))?;

        rows.iter()
            .map(|r| {
                r.try_get::<uuid::Uuid, _>("product_id")
                    .map(ProductId::from_uuid)
                    .map_err(|e| StoreError::Corrupt(format!("favorite row: {e}")))
            })
            .collect()
    }
}

fn price_to_column(price: Price) -> Result<i64, StoreError> {
    i64::try_from(price.minor_units())
        .map_err(|_| StoreError::Integrity(format!("price {price} does not fit a BIGINT column")))
}

fn decode<'r, T: FromRow<'r, PgRow>>(row: &'r PgRow) -> Result<T, StoreError> {
    T::from_row(row).map_err(|e| StoreError::Corrupt(format!("failed to decode row: {e}")))
}

/// Map SQLx errors to StoreError with context.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") | Some("23514") => StoreError::Integrity(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

// SQLx row types

#[derive(Debug)]
struct AccountRow {
    id: uuid::Uuid,
    email: String,
    secret_hash: String,
    role: String,
    owned_brand_id: Option<uuid::Uuid>,
    display_name: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for AccountRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AccountRow {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            secret_hash: row.try_get("secret_hash")?,
            role: row.try_get("role")?,
            owned_brand_id: row.try_get("owned_brand_id")?,
            display_name: row.try_get("display_name")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email)
            .map_err(|e| StoreError::Corrupt(format!("account {}: {e}", row.id)))?;
        let role: Role = row
            .role
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("account {}: {e}", row.id)))?;

        Account::restore(
            PrincipalId::from_uuid(row.id),
            email,
            SecretHash::from_phc(row.secret_hash),
            role,
            row.owned_brand_id.map(BrandId::from_uuid),
            row.display_name,
            row.created_at,
        )
        .map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}

#[derive(Debug)]
struct BrandRow {
    id: uuid::Uuid,
    owner_id: uuid::Uuid,
    status: String,
    name: String,
    category: Option<String>,
    description: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    social: Json<SocialLinks>,
    logo: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for BrandRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(BrandRow {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            status: row.try_get("status")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            description: row.try_get("description")?,
            contact_email: row.try_get("contact_email")?,
            contact_phone: row.try_get("contact_phone")?,
            social: row.try_get("social")?,
            logo: row.try_get("logo")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<BrandRow> for Brand {
    type Error = StoreError;

    fn try_from(row: BrandRow) -> Result<Self, Self::Error> {
        let status: BrandStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("brand {}: {e}", row.id)))?;

        Ok(Brand::restore(
            BrandId::from_uuid(row.id),
            PrincipalId::from_uuid(row.owner_id),
            status,
            BrandProfile {
                name: row.name,
                category: row.category,
                description: row.description,
                contact_email: row.contact_email,
                contact_phone: row.contact_phone,
                social: row.social.0,
                logo: row.logo,
            },
            row.created_at,
            row.updated_at,
        ))
    }
}

#[derive(Debug)]
struct ProductRow {
    id: uuid::Uuid,
    brand_id: uuid::Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    images: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            brand_id: row.try_get("brand_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            images: row.try_get("images")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let units = u64::try_from(row.price)
            .map_err(|_| StoreError::Corrupt(format!("product {}: negative price", row.id)))?;

        Ok(Product::restore(
            ProductId::from_uuid(row.id),
            BrandId::from_uuid(row.brand_id),
            row.name,
            row.description,
            Price::from_minor_units(units),
            row.images.0,
            row.created_at,
            row.updated_at,
        ))
    }
}
