use inventra_auth::{Principal, RoleName};
use inventra_core::AccountId;

/// Principal context for a request (authenticated identity + roles).
///
/// Inserted by the auth middleware; immutable for the rest of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn account_id(&self) -> AccountId {
        self.principal.account_id()
    }

    pub fn roles(&self) -> &[RoleName] {
        self.principal.roles()
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
