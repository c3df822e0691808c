//! Inventory domain module: stock lots and audit sessions.
//!
//! This crate contains the data model for the stock ledger and the inventory
//! session store, implemented purely as deterministic domain logic (no IO, no
//! HTTP, no storage).

pub mod gauge;
pub mod patch;
pub mod pool;
pub mod session;
pub mod stock;

pub use gauge::Gauge;
pub use patch::{LotPatch, SessionPatch};
pub use pool::{audit_pool, distinct_pairs, natural_cmp};
pub use session::{
    AuditedLotEntry, InventorySession, PairKey, PairState, SessionStatus, active_session,
    latest_session, pair_state,
};
pub use stock::{HistoryEntry, HistoryKind, LotStatus, StockItem};
