use serde::{Deserialize, Serialize};

use souk_core::PrincipalId;

use crate::Role;

/// Identity of an authenticated caller, as asserted by a verified token.
///
/// Deliberately carries no brand reference: ownership is re-resolved from the
/// repository on every authorization decision.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalDescriptor {
    pub principal_id: PrincipalId,
    pub role: Role,
}

impl PrincipalDescriptor {
    pub fn new(principal_id: PrincipalId, role: Role) -> Self {
        Self { principal_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
