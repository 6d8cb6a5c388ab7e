//! Brand lifecycle manager: the only writer of brand status.
//!
//! Every status change goes through [`LifecycleManager::transition`], which
//! checks the acting role, the edge table, and then applies the change with a
//! compare-and-set so concurrent transitions cannot overwrite each other.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use souk_auth::PrincipalDescriptor;
use souk_catalog::{Brand, BrandStatus};
use souk_core::BrandId;

use crate::audit::{AuditEvent, AuditSink};
use crate::store::{ResourceRepository, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("only admins may change brand status")]
    Forbidden,

    #[error("brand not found")]
    NotFound,

    #[error("cannot move brand from {from} to {to}")]
    InvalidTransition { from: BrandStatus, to: BrandStatus },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct LifecycleManager {
    repo: Arc<dyn ResourceRepository>,
    audit: Arc<dyn AuditSink>,
    initial_status: BrandStatus,
}

impl LifecycleManager {
    /// New brands start `approved`.
    pub fn new(repo: Arc<dyn ResourceRepository>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            repo,
            audit,
            initial_status: BrandStatus::Approved,
        }
    }

    /// With moderation on, new brands start `pending` and wait for an admin.
    pub fn with_moderation(mut self, enabled: bool) -> Self {
        self.initial_status = if enabled {
            BrandStatus::Pending
        } else {
            BrandStatus::Approved
        };
        self
    }

    /// Status assigned to brands at signup.
    pub fn initial_status(&self) -> BrandStatus {
        self.initial_status
    }

    /// Move a brand to `target`.
    ///
    /// Checks, in order: the acting role (before any read), brand existence, and
    /// the edge table. A transition to the current status is invalid. If the
    /// status changed between the read and the write, the error reports the
    /// status that is actually stored.
    pub async fn transition(
        &self,
        brand_id: BrandId,
        target: BrandStatus,
        acting: &PrincipalDescriptor,
    ) -> Result<Brand, LifecycleError> {
        if !acting.is_admin() {
            tracing::warn!(
                brand_id = %brand_id,
                principal_id = %acting.principal_id,
                role = %acting.role,
                "non-admin attempted a brand status change"
            );
            return Err(LifecycleError::Forbidden);
        }

        let current = self
            .repo
            .find_brand(brand_id)
            .await?
            .ok_or(LifecycleError::NotFound)?
            .status();

        if !current.can_transition_to(target) {
            return Err(LifecycleError::InvalidTransition {
                from: current,
                to: target,
            });
        }

        if !self
            .repo
            .write_brand_status(brand_id, current, target)
            .await?
        {
            // Lost a race; report against what is stored now.
            let observed = self
                .repo
                .find_brand(brand_id)
                .await?
                .ok_or(LifecycleError::NotFound)?
                .status();
            tracing::warn!(
                brand_id = %brand_id,
                expected = %current,
                observed = %observed,
                target = %target,
                "brand status changed concurrently"
            );
            return Err(LifecycleError::InvalidTransition {
                from: observed,
                to: target,
            });
        }

        let brand = self
            .repo
            .find_brand(brand_id)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        self.audit.record(AuditEvent::BrandStatusChanged {
            brand_id,
            from: current,
            to: target,
            actor: acting.principal_id,
            at: Utc::now(),
        });
        tracing::info!(
            brand_id = %brand_id,
            from = %current,
            to = %target,
            actor = %acting.principal_id,
            "brand status changed"
        );

        Ok(brand)
    }
}

impl core::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("initial_status", &self.initial_status)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditSink;
    use crate::store::InMemoryStore;
    use souk_auth::Role;
    use souk_catalog::BrandProfile;
    use souk_core::PrincipalId;

    async fn setup(status: BrandStatus) -> (LifecycleManager, Arc<InMemoryAuditSink>, BrandId) {
        let store = Arc::new(InMemoryStore::new());
        let audit = Arc::new(InMemoryAuditSink::new());
        let brand = Brand::create(
            BrandId::new(),
            PrincipalId::new(),
            BrandProfile::named("Alice Wear"),
            status,
            Utc::now(),
        )
        .unwrap();
        store.create_brand(&brand).await.unwrap();
        let manager = LifecycleManager::new(store, audit.clone());
        (manager, audit, brand.id_typed())
    }

    fn admin() -> PrincipalDescriptor {
        PrincipalDescriptor::new(PrincipalId::new(), Role::Admin)
    }

    #[tokio::test]
    async fn admin_moves_pending_brand_to_approved() {
        let (manager, audit, id) = setup(BrandStatus::Pending).await;
        let brand = manager
            .transition(id, BrandStatus::Approved, &admin())
            .await
            .unwrap();
        assert_eq!(brand.status(), BrandStatus::Approved);
        assert_eq!(audit.all().len(), 1);
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let (manager, audit, id) = setup(BrandStatus::Approved).await;
        for role in [Role::Client, Role::BrandOwner] {
            let actor = PrincipalDescriptor::new(PrincipalId::new(), role);
            let err = manager
                .transition(id, BrandStatus::Banned, &actor)
                .await
                .unwrap_err();
            assert_eq!(err, LifecycleError::Forbidden);
        }
        assert!(audit.all().is_empty());
    }

    #[tokio::test]
    async fn forbidden_wins_over_not_found() {
        let (manager, _, _) = setup(BrandStatus::Approved).await;
        let owner = PrincipalDescriptor::new(PrincipalId::new(), Role::BrandOwner);
        let err = manager
            .transition(BrandId::new(), BrandStatus::Banned, &owner)
            .await
            .unwrap_err();
        assert_eq!(err, LifecycleError::Forbidden);
    }

    #[tokio::test]
    async fn unknown_brand_is_not_found() {
        let (manager, _, _) = setup(BrandStatus::Approved).await;
        let err = manager
            .transition(BrandId::new(), BrandStatus::Banned, &admin())
            .await
            .unwrap_err();
        assert_eq!(err, LifecycleError::NotFound);
    }

    #[tokio::test]
    async fn same_status_is_an_invalid_transition() {
        let (manager, audit, id) = setup(BrandStatus::Approved).await;
        let err = manager
            .transition(id, BrandStatus::Approved, &admin())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LifecycleError::InvalidTransition {
                from: BrandStatus::Approved,
                to: BrandStatus::Approved
            }
        );
        assert!(audit.all().is_empty());
    }

    #[tokio::test]
    async fn banned_is_terminal() {
        let (manager, _, id) = setup(BrandStatus::Banned).await;
        for target in [BrandStatus::Approved, BrandStatus::Pending, BrandStatus::Rejected] {
            let err = manager.transition(id, target, &admin()).await.unwrap_err();
            assert!(matches!(
                err,
                LifecycleError::InvalidTransition {
                    from: BrandStatus::Banned,
                    ..
                }
            ));
        }
    }

    #[test]
    fn moderation_switches_initial_status() {
        let store = Arc::new(InMemoryStore::new());
        let audit = Arc::new(InMemoryAuditSink::new());
        let manager = LifecycleManager::new(store.clone(), audit.clone());
        assert_eq!(manager.initial_status(), BrandStatus::Approved);
        let moderated = LifecycleManager::new(store, audit).with_moderation(true);
        assert_eq!(moderated.initial_status(), BrandStatus::Pending);
    }
}
