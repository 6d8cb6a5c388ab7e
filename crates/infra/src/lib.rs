//! Infrastructure layer: stores, and the services that coordinate them.
//!
//! - `store`: credential store, resource repository and favorites (in-memory + Postgres)
//! - `authz`: the authorization entry point (fresh ownership read + policy evaluation)
//! - `lifecycle`: the only writer of brand status
//! - `provisioning`: signup / sign-in / admin bootstrap
//! - `audit`: audit event sink (stub: tracing-backed)

pub mod audit;
pub mod authz;
pub mod lifecycle;
pub mod provisioning;
pub mod store;


pub use audit::{AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use authz::Authorizer;
pub use lifecycle::{LifecycleError, LifecycleManager};
pub use provisioning::{
    AccountProvisioning, Credentials, ProvisioningError, SignInOutcome, SignUpKind,
    SignUpOutcome, SignUpProfile,
};
pub use store::{
    CredentialStore, FavoriteStore, InMemoryStore, PgStore, ResourceRepository, StoreError,
};
