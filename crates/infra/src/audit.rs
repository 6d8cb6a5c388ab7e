//! Audit sink.
//!
//! Audit records are separate from application logs: services emit an
//! [`AuditEvent`] for every state change that matters to moderation, and the
//! sink decides where it goes. Production wiring uses [`TracingAuditSink`].

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use souk_auth::Role;
use souk_catalog::BrandStatus;
use souk_core::{BrandId, PrincipalId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    AccountCreated {
        principal_id: PrincipalId,
        role: Role,
        at: DateTime<Utc>,
    },
    BrandCreated {
        brand_id: BrandId,
        owner_id: PrincipalId,
        status: BrandStatus,
        at: DateTime<Utc>,
    },
    BrandStatusChanged {
        brand_id: BrandId,
        from: BrandStatus,
        to: BrandStatus,
        actor: PrincipalId,
        at: DateTime<Utc>,
    },
    /// A brand write was rolled back because the owner's account write failed.
    SignupCompensated {
        brand_id: BrandId,
        owner_id: PrincipalId,
        at: DateTime<Utc>,
    },
}

impl AuditEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::AccountCreated { .. } => "account_created",
            AuditEvent::BrandCreated { .. } => "brand_created",
            AuditEvent::BrandStatusChanged { .. } => "brand_status_changed",
            AuditEvent::SignupCompensated { .. } => "signup_compensated",
        }
    }
}

pub trait AuditSink: Send + Sync + 'static {
    fn record(&self, event: AuditEvent);
}

/// Writes audit events as structured `tracing` events under the `souk::audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let payload = serde_json::to_string(&event).unwrap_or_default();
        tracing::info!(target: "souk::audit", kind = event.kind(), event = %payload, "audit");
    }
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    inner: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<AuditEvent> {
        self.inner
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.inner.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_a_type_tag() {
        let event = AuditEvent::BrandStatusChanged {
            brand_id: BrandId::new(),
            from: BrandStatus::Approved,
            to: BrandStatus::Banned,
            actor: PrincipalId::new(),
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "brand_status_changed");
        assert_eq!(json["from"], "approved");
        assert_eq!(json["to"], "banned");
    }

    #[test]
    fn in_memory_sink_keeps_order() {
        let sink = InMemoryAuditSink::new();
        let owner = PrincipalId::new();
        sink.record(AuditEvent::AccountCreated {
            principal_id: owner,
            role: Role::Client,
            at: Utc::now(),
        });
        sink.record(AuditEvent::SignupCompensated {
            brand_id: BrandId::new(),
            owner_id: owner,
            at: Utc::now(),
        });
        let kinds: Vec<_> = sink.all().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["account_created", "signup_compensated"]);
    }
}
