//! Service wiring: stores, token codec, and the infra services on top of them.
//!
//! `build_services` picks the in-memory store (dev/test) or Postgres
//! (`USE_PERSISTENT_STORES=true`), then bootstraps the configured admin.

use std::sync::Arc;

use thiserror::Error;

use souk_auth::{Hs256TokenCodec, TokenCodec};
use souk_infra::{
    AccountProvisioning, AuditSink, Authorizer, CredentialStore, FavoriteStore, InMemoryStore,
    LifecycleManager, PgStore, ProvisioningError, ResourceRepository, StoreError,
    TracingAuditSink,
};

use crate::config::ApiConfig;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("admin bootstrap failed: {0}")]
    AdminBootstrap(#[from] ProvisioningError),
}

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppServices {
    pub accounts: Arc<dyn CredentialStore>,
    pub repo: Arc<dyn ResourceRepository>,
    pub favorites: Arc<dyn FavoriteStore>,
    pub tokens: Arc<dyn TokenCodec>,
    pub authorizer: Authorizer,
    pub lifecycle: Arc<LifecycleManager>,
    pub provisioning: AccountProvisioning,
    backend: &'static str,
}

impl AppServices {
    /// Wire services over a store that implements all three store traits.
    fn wire<S>(store: Arc<S>, config: &ApiConfig, backend: &'static str) -> Self
    where
        S: CredentialStore + ResourceRepository + FavoriteStore + 'static,
    {
        let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
        let tokens: Arc<dyn TokenCodec> = Arc::new(Hs256TokenCodec::new(
            config.jwt_secret.as_bytes(),
            config.token_ttl,
        ));

        let accounts: Arc<dyn CredentialStore> = store.clone();
        let repo: Arc<dyn ResourceRepository> = store.clone();
        let favorites: Arc<dyn FavoriteStore> = store;

        let lifecycle = Arc::new(
            LifecycleManager::new(repo.clone(), audit.clone())
                .with_moderation(config.brand_moderation),
        );
        let provisioning = AccountProvisioning::new(
            accounts.clone(),
            repo.clone(),
            lifecycle.clone(),
            tokens.clone(),
            audit,
        );

        Self {
            accounts,
            authorizer: Authorizer::new(repo.clone()),
            repo,
            favorites,
            tokens,
            lifecycle,
            provisioning,
            backend,
        }
    }

    pub fn in_memory(config: &ApiConfig) -> Self {
        Self::wire(Arc::new(InMemoryStore::new()), config, "in_memory")
    }

    pub async fn postgres(config: &ApiConfig, database_url: &str) -> Result<Self, StoreError> {
        let store = PgStore::connect(database_url).await?;
        store.migrate().await?;
        Ok(Self::wire(Arc::new(store), config, "postgres"))
    }

    /// Which store backs this instance (`in_memory` or `postgres`).
    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StartupError> {
    let services = match &config.database_url {
        Some(url) => AppServices::postgres(config, url).await?,
        None => AppServices::in_memory(config),
    };
    tracing::info!(
        backend = services.backend(),
        brand_moderation = config.brand_moderation,
        "services wired"
    );

    if let Some(admin) = &config.admin {
        services
            .provisioning
            .ensure_admin(&admin.email, &admin.password, &admin.display_name)
            .await?;
    }

    Ok(services)
}
