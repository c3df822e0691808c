use rodstock_auth::{Principal, PrincipalId, Role};

/// Identity of the operator behind a request.
///
/// Inserted by [`crate::middleware::identity_middleware`]; every `/audit` route
/// can rely on it being present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, name: String, roles: Vec<Role>) -> Self {
        Self {
            principal: Principal::with_roles(principal_id, name, roles),
        }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal.principal_id
    }

    pub fn name(&self) -> &str {
        &self.principal.name
    }

    pub fn roles(&self) -> &[Role] {
        &self.principal.roles
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
