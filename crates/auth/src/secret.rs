//! Shared approval passphrase.
//!
//! This is a manual confirmation gate on top of RBAC, not an authentication
//! mechanism: whoever approves an audit must also type the passphrase.

/// Passphrase required to apply an audit to stock.
#[derive(Clone, PartialEq, Eq)]
pub struct ApprovalSecret(String);

impl ApprovalSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Compare a candidate against the passphrase.
    ///
    /// Exact match (no trimming, case-sensitive); the comparison does not
    /// short-circuit on the first differing byte.
    pub fn verify(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl core::fmt::Debug for ApprovalSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ApprovalSecret(***)")
    }
}
