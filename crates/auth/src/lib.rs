//! Role-based authorization for the audit workflow.
//!
//! This crate is intentionally decoupled from HTTP and storage. Identity is
//! asserted by the caller; this crate only decides what an identity may do.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod secret;

pub use authorize::{AuthzError, Principal, authorize};
pub use permissions::Permission;
pub use principal::PrincipalId;
pub use roles::Role;
pub use secret::ApprovalSecret;
