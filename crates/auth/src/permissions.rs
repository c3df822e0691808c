use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "inventory.audit.count").
/// The wildcard permission `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Record physical counts and quick-add lots.
    pub const AUDIT_COUNT: Permission = Permission::from_static("inventory.audit.count");
    /// Finish, reopen and delete audit sessions; start a counting cycle.
    pub const AUDIT_MANAGE: Permission = Permission::from_static("inventory.audit.manage");
    /// Apply a completed audit to the stock ledger.
    pub const AUDIT_APPROVE: Permission = Permission::from_static("inventory.audit.approve");
    /// Read sessions, pools and divergence reports.
    pub const AUDIT_READ: Permission = Permission::from_static("inventory.audit.read");
    pub const WILDCARD: Permission = Permission::from_static("*");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
