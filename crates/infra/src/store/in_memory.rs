use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use souk_auth::Account;
use souk_catalog::{Brand, BrandStatus, Product};
use souk_core::{BrandId, Email, PrincipalId, ProductId};

use super::r#trait::{CredentialStore, FavoriteStore, ResourceRepository, StoreError};

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<PrincipalId, Account>,
    emails: HashMap<Email, PrincipalId>,
    brands: HashMap<BrandId, Brand>,
    products: HashMap<ProductId, Product>,
    favorites: HashMap<PrincipalId, Vec<ProductId>>,
}

impl Tables {
    fn brand_owned_by_account(&self, brand_id: BrandId) -> bool {
        self.accounts
            .values()
            .any(|a| a.owned_brand_id() == Some(brand_id))
    }
}

/// In-memory store implementing every store trait over one set of tables.
///
/// Intended for tests/dev. A single lock guards all tables, so each operation
/// (including the status compare-and-set) is atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .emails
            .get(email)
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Account>, StoreError> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    async fn create(&self, account: &Account) -> Result<(), StoreError> {
        let mut tables = self.write()?;

        if tables.emails.contains_key(account.email()) {
            return Err(StoreError::Conflict(format!(
                "email {} is already registered",
                account.email()
            )));
        }
        if tables.accounts.contains_key(&account.id_typed()) {
            return Err(StoreError::Conflict(format!(
                "account {} already exists",
                account.id_typed()
            )));
        }
        if let Some(brand_id) = account.owned_brand_id() {
            if !tables.brands.contains_key(&brand_id) {
                return Err(StoreError::Integrity(format!("brand {brand_id} does not exist")));
            }
            if tables.brand_owned_by_account(brand_id) {
                return Err(StoreError::Conflict(format!("brand {brand_id} already has an owner")));
            }
        }

        tables
            .emails
            .insert(account.email().clone(), account.id_typed());
        tables.accounts.insert(account.id_typed(), account.clone());
        Ok(())
    }
}

#[async_trait]
impl ResourceRepository for InMemoryStore {
    async fn find_brand(&self, id: BrandId) -> Result<Option<Brand>, StoreError> {
        Ok(self.read()?.brands.get(&id).cloned())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn create_brand(&self, brand: &Brand) -> Result<BrandId, StoreError> {
        let mut tables = self.write()?;
        let id = brand.id_typed();

        if tables.brands.contains_key(&id) {
            return Err(StoreError::Conflict(format!("brand {id} already exists")));
        }
        if tables
            .brands
            .values()
            .any(|b| b.owner_id() == brand.owner_id())
        {
            return Err(StoreError::Conflict(format!(
                "principal {} already owns a brand",
                brand.owner_id()
            )));
        }

        tables.brands.insert(id, brand.clone());
        Ok(id)
    }

    async fn delete_brand(&self, id: BrandId) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if tables.brand_owned_by_account(id) {
            return Err(StoreError::Integrity(format!(
                "brand {id} is still referenced by its owner account"
            )));
        }
        if tables.brands.remove(&id).is_none() {
            return Ok(false);
        }

        let orphaned: Vec<ProductId> = tables
            .products
            .values()
            .filter(|p| p.brand_id() == id)
            .map(|p| p.id_typed())
            .collect();
        for product_id in orphaned {
            tables.products.remove(&product_id);
            for favs in tables.favorites.values_mut() {
                favs.retain(|f| *f != product_id);
            }
        }
        Ok(true)
    }

    async fn write_brand_status(
        &self,
        id: BrandId,
        expected: BrandStatus,
        new: BrandStatus,
    ) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let Some(current) = tables.brands.get(&id) else {
            return Ok(false);
        };
        if current.status() != expected {
            return Ok(false);
        }

        let updated = current.clone().with_status(new, Utc::now());
        tables.brands.insert(id, updated);
        Ok(true)
    }

    async fn save_brand_profile(&self, brand: &Brand) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let Some(stored) = tables.brands.get(&brand.id_typed()) else {
            return Err(StoreError::NotFound);
        };

        // Keep whatever status is stored now; the caller's copy may be stale.
        let merged = Brand::restore(
            stored.id_typed(),
            stored.owner_id(),
            stored.status(),
            brand.profile().clone(),
            stored.created_at(),
            brand.updated_at(),
        );
        tables.brands.insert(merged.id_typed(), merged);
        Ok(())
    }

    async fn list_brands(&self, status: Option<BrandStatus>) -> Result<Vec<Brand>, StoreError> {
        let tables = self.read()?;
        let mut brands: Vec<Brand> = tables
            .brands
            .values()
            .filter(|b| status.is_none_or(|s| b.status() == s))
            .cloned()
            .collect();
        brands.sort_by_key(|b| (b.created_at(), *b.id_typed().as_uuid()));
        Ok(brands)
    }

    async fn create_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.brands.contains_key(&product.brand_id()) {
            return Err(StoreError::Integrity(format!(
                "brand {} does not exist",
                product.brand_id()
            )));
        }
        if tables.products.contains_key(&product.id_typed()) {
            return Err(StoreError::Conflict(format!(
                "product {} already exists",
                product.id_typed()
            )));
        }
        tables.products.insert(product.id_typed(), product.clone());
        Ok(())
    }

    async fn save_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        match tables.products.get_mut(&product.id_typed()) {
            Some(stored) => {
                *stored = product.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        for favs in tables.favorites.values_mut() {
            favs.retain(|f| *f != id);
        }
        Ok(true)
    }

    async fn list_products(
        &self,
        brand_id: Option<BrandId>,
        public_only: bool,
    ) -> Result<Vec<Product>, StoreError> {
        let tables = self.read()?;
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| brand_id.is_none_or(|b| p.brand_id() == b))
            .filter(|p| {
                !public_only
                    || tables
                        .brands
                        .get(&p.brand_id())
                        .is_some_and(|b| b.status().is_public())
            })
            .cloned()
            .collect();
        products.sort_by_key(|p| (p.created_at(), *p.id_typed().as_uuid()));
        Ok(products)
    }
}

#[async_trait]
impl FavoriteStore for InMemoryStore {
    async fn add_favorite(&self, principal: PrincipalId, product: ProductId) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.products.contains_key(&product) {
            return Err(StoreError::Integrity(format!("product {product} does not exist")));
        }
        let favs = tables.favorites.entry(principal).or_default();
        if !favs.contains(&product) {
            favs.push(product);
        }
        Ok(())
    }

    async fn remove_favorite(
        &self,
        principal: PrincipalId,
        product: ProductId,
    ) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let Some(favs) = tables.favorites.get_mut(&principal) else {
            return Ok(false);
        };
        let before = favs.len();
        favs.retain(|f| *f != product);
        Ok(favs.len() != before)
    }

    async fn list_favorites(&self, principal: PrincipalId) -> Result<Vec<ProductId>, StoreError> {
        Ok(self
            .read()?
            .favorites
            .get(&principal)
            .cloned()
            .unwrap_or_default())
    }
}
