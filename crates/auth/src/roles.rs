use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier used for RBAC.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Full access, including the approval gate.
    pub const ADMIN: Role = Role::from_static("admin");
    /// Stock supervisor: manages sessions and may approve.
    pub const SUPERVISOR: Role = Role::from_static("supervisor");
    /// Floor operator: counts lots.
    pub const OPERATOR: Role = Role::from_static("operator");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Static role→permission policy. Unknown roles grant nothing.
    pub fn permissions(&self) -> Vec<Permission> {
        match self.as_str() {
            "admin" => vec![Permission::WILDCARD],
            "supervisor" => vec![
                Permission::AUDIT_READ,
                Permission::AUDIT_COUNT,
                Permission::AUDIT_MANAGE,
                Permission::AUDIT_APPROVE,
            ],
            "operator" => vec![Permission::AUDIT_READ, Permission::AUDIT_COUNT],
            _ => Vec::new(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Effective permissions granted by a set of roles (deduplicated, order kept).
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    let mut out: Vec<Permission> = Vec::new();
    for perm in roles.iter().flat_map(Role::permissions) {
        if !out.contains(&perm) {
            out.push(perm);
        }
    }
    out
}
