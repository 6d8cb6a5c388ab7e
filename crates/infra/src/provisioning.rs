//! Account provisioning: signup, sign-in and the admin bootstrap.
//!
//! A brand-owner signup writes two records (brand, then account). If the
//! account write fails, the brand is deleted again before the error is
//! returned, so no brand is ever left without an owner. The write sequence runs
//! on its own task: a caller that goes away mid-signup cannot stop it halfway.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use souk_auth::{
    Account, IssuedToken, Role, SecretHash, TokenCodec, TokenError, hash_secret, validate_secret,
    verify_against_decoy,
};
use souk_catalog::{Brand, BrandProfile};
use souk_core::{BrandId, Email, PrincipalId};

use crate::audit::{AuditEvent, AuditSink};
use crate::lifecycle::LifecycleManager;
use crate::store::{CredentialStore, ResourceRepository, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(StoreError),

    /// Hashing failed or a worker task died.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ProvisioningError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ProvisioningError::Conflict(msg),
            other => ProvisioningError::Store(other),
        }
    }
}

fn validation(err: impl ToString) -> ProvisioningError {
    ProvisioningError::Validation(err.to_string())
}

fn internal(err: impl ToString) -> ProvisioningError {
    ProvisioningError::Internal(err.to_string())
}

/// Account kinds open to self-service signup. Admins are bootstrapped only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpKind {
    Client,
    BrandOwner,
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignUpProfile {
    pub display_name: String,
    /// Required for brand owners, rejected for clients.
    pub brand: Option<BrandProfile>,
}

#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub account: Account,
    pub brand: Option<Brand>,
}

#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub account: Account,
    pub token: IssuedToken,
}

pub struct AccountProvisioning {
    credentials: Arc<dyn CredentialStore>,
    repo: Arc<dyn ResourceRepository>,
    lifecycle: Arc<LifecycleManager>,
    tokens: Arc<dyn TokenCodec>,
    audit: Arc<dyn AuditSink>,
}

impl AccountProvisioning {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        repo: Arc<dyn ResourceRepository>,
        lifecycle: Arc<LifecycleManager>,
        tokens: Arc<dyn TokenCodec>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            credentials,
            repo,
            lifecycle,
            tokens,
            audit,
        }
    }

    /// Register a client, or a brand owner together with their brand.
    ///
    /// Validation and the duplicate-email check happen before any write.
    pub async fn sign_up(
        &self,
        kind: SignUpKind,
        credentials: Credentials,
        profile: SignUpProfile,
    ) -> Result<SignUpOutcome, ProvisioningError> {
        let email = Email::parse(&credentials.email).map_err(validation)?;
        validate_secret(&credentials.password).map_err(validation)?;

        let display_name = profile.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(validation("display name cannot be empty"));
        }

        let brand_profile = match (kind, profile.brand) {
            (SignUpKind::Client, None) => None,
            (SignUpKind::Client, Some(_)) => {
                return Err(validation("client accounts cannot register a brand"));
            }
            (SignUpKind::BrandOwner, Some(brand)) => {
                brand.validate().map_err(validation)?;
                Some(brand)
            }
            (SignUpKind::BrandOwner, None) => {
                return Err(validation("brand details are required for brand owners"));
            }
        };

        if self.credentials.find_by_email(&email).await?.is_some() {
            return Err(ProvisioningError::Conflict(format!(
                "email {email} is already registered"
            )));
        }

        let secret_hash = hash_off_thread(credentials.password).await?;
        let principal_id = PrincipalId::new();
        let now = Utc::now();

        let Some(brand_profile) = brand_profile else {
            let account = Account::client(principal_id, email, secret_hash, display_name, now);
            let store = self.credentials.clone();
            let audit = self.audit.clone();
            let record = account.clone();
            tokio::spawn(async move {
                store.create(&record).await?;
                audit.record(AuditEvent::AccountCreated {
                    principal_id,
                    role: Role::Client,
                    at: now,
                });
                tracing::info!(principal_id = %principal_id, role = "client", "account created");
                Ok::<_, StoreError>(())
            })
            .await
            .map_err(internal)??;

            return Ok(SignUpOutcome {
                account,
                brand: None,
            });
        };

        let brand = Brand::create(
            BrandId::new(),
            principal_id,
            brand_profile,
            self.lifecycle.initial_status(),
            now,
        )
        .map_err(validation)?;
        let account = Account::brand_owner(
            principal_id,
            email,
            secret_hash,
            display_name,
            brand.id_typed(),
            now,
        );

        tokio::spawn(write_brand_then_owner(
            self.repo.clone(),
            self.credentials.clone(),
            self.audit.clone(),
            brand.clone(),
            account.clone(),
        ))
        .await
        .map_err(internal)??;

        Ok(SignUpOutcome {
            account,
            brand: Some(brand),
        })
    }

    /// Check credentials and issue a token.
    ///
    /// Unknown email, malformed email and wrong password all fail the same way.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<SignInOutcome, ProvisioningError> {
        let account = match Email::parse(&credentials.email) {
            Ok(email) => self.credentials.find_by_email(&email).await?,
            Err(_) => None,
        };

        let password = credentials.password;
        let verified = tokio::task::spawn_blocking(move || match account {
            Some(account) => account.verify_secret(&password).then_some(account),
            None => {
                verify_against_decoy(&password);
                None
            }
        })
        .await
        .map_err(internal)?;

        let Some(account) = verified else {
            tracing::warn!("sign-in rejected");
            return Err(ProvisioningError::InvalidCredentials);
        };

        let token = self.tokens.issue(&account, Utc::now())?;
        tracing::info!(
            principal_id = %account.id_typed(),
            role = %account.role(),
            "signed in"
        );
        Ok(SignInOutcome { account, token })
    }

    /// Make sure an admin account exists for `email`.
    ///
    /// Returns the existing admin unchanged if there is one; fails with
    /// `Conflict` if the email belongs to a non-admin account.
    pub async fn ensure_admin(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Account, ProvisioningError> {
        let email = Email::parse(email).map_err(validation)?;
        validate_secret(password).map_err(validation)?;

        if let Some(existing) = self.credentials.find_by_email(&email).await? {
            if existing.role() == Role::Admin {
                tracing::info!(principal_id = %existing.id_typed(), "admin account already present");
                return Ok(existing);
            }
            return Err(ProvisioningError::Conflict(format!(
                "email {email} belongs to a non-admin account"
            )));
        }

        let secret_hash = hash_off_thread(password.to_string()).await?;
        let now = Utc::now();
        let account = Account::admin(PrincipalId::new(), email, secret_hash, display_name, now);
        self.credentials.create(&account).await?;

        self.audit.record(AuditEvent::AccountCreated {
            principal_id: account.id_typed(),
            role: Role::Admin,
            at: now,
        });
        tracing::info!(principal_id = %account.id_typed(), "admin account bootstrapped");
        Ok(account)
    }
}

impl core::fmt::Debug for AccountProvisioning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountProvisioning")
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

async fn hash_off_thread(password: String) -> Result<SecretHash, ProvisioningError> {
    tokio::task::spawn_blocking(move || hash_secret(&password))
        .await
        .map_err(internal)?
        .map_err(internal)
}

/// Brand first, then its owner; on owner failure the brand is removed again.
/// Audit events are recorded here so they survive a caller that went away.
async fn write_brand_then_owner(
    repo: Arc<dyn ResourceRepository>,
    credentials: Arc<dyn CredentialStore>,
    audit: Arc<dyn AuditSink>,
    brand: Brand,
    account: Account,
) -> Result<(), ProvisioningError> {
    let brand_id = repo.create_brand(&brand).await?;

    let Err(cause) = credentials.create(&account).await else {
        let at = brand.created_at();
        audit.record(AuditEvent::BrandCreated {
            brand_id,
            owner_id: account.id_typed(),
            status: brand.status(),
            at,
        });
        audit.record(AuditEvent::AccountCreated {
            principal_id: account.id_typed(),
            role: Role::BrandOwner,
            at,
        });
        tracing::info!(
            principal_id = %account.id_typed(),
            brand_id = %brand_id,
            status = %brand.status(),
            role = "brand_owner",
            "brand owner account created"
        );
        return Ok(());
    };

    tracing::warn!(
        brand_id = %brand_id,
        principal_id = %account.id_typed(),
        error = %cause,
        "owner account write failed; removing brand"
    );

    match repo.delete_brand(brand_id).await {
        Ok(_) => {
            audit.record(AuditEvent::SignupCompensated {
                brand_id,
                owner_id: account.id_typed(),
                at: Utc::now(),
            });
            Err(cause.into())
        }
        Err(compensation) => {
            tracing::error!(
                brand_id = %brand_id,
                cause = %cause,
                error = %compensation,
                "failed to remove brand after owner account write failed"
            );
            Err(ProvisioningError::Store(compensation))
        }
    }
}
