//! Domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model and weight comparison rules.

pub mod error;
pub mod id;
pub mod weight;

pub use error::{DomainError, DomainResult};
pub use id::{LotId, SessionId};
pub use weight::{AUDIT_TOLERANCE_KG, Kg, exceeds_tolerance, within_tolerance};
