//! Audit workflow error model.

use thiserror::Error;

use rodstock_auth::AuthzError;
use rodstock_core::{DomainError, SessionId};
use rodstock_infra::StoreError;

pub type AuditResult<T> = Result<T, AuditError>;

/// Every variant is surfaced to the operator; none is swallowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// Rejected input or a disallowed transition; nothing was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing permission or wrong approval passphrase; nothing was written.
    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("session {0} was already applied to stock")]
    AlreadyApplied(SessionId),

    /// The operator declined a confirmation.
    #[error("cancelled by operator")]
    Cancelled,

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl AuditError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<DomainError> for AuditError {
    fn from(value: DomainError) -> Self {
        AuditError::Validation(value.to_string())
    }
}

impl From<AuthzError> for AuditError {
    fn from(value: AuthzError) -> Self {
        AuditError::Authorization(value.to_string())
    }
}
