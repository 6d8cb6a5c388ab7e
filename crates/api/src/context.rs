use souk_auth::{PrincipalDescriptor, Role};
use souk_core::PrincipalId;

/// Caller identity for a request, as established by the auth middleware.
///
/// `None` means the request carried no `Authorization` header. Requests with an
/// invalid token never reach a handler.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct RequestPrincipal(Option<PrincipalDescriptor>);

impl RequestPrincipal {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn authenticated(descriptor: PrincipalDescriptor) -> Self {
        Self(Some(descriptor))
    }

    pub fn descriptor(&self) -> Option<&PrincipalDescriptor> {
        self.0.as_ref()
    }

    pub fn principal_id(&self) -> Option<PrincipalId> {
        self.0.map(|p| p.principal_id)
    }

    pub fn role(&self) -> Option<Role> {
        self.0.map(|p| p.role)
    }
}
