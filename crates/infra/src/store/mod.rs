//! Stock ledger and session store boundary.
//!
//! This module defines the asynchronous, non-transactional write contract the
//! audit workflow issues against its collaborators, without making any storage
//! assumptions.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryLedger, InMemorySessionStore};
pub use r#trait::{LedgerStore, SessionStore, StoreError};
