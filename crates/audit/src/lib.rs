//! Physical inventory audit reconciliation.
//!
//! - [`engine`]: per-pair counting sessions, quick-add lots, finalize
//! - [`cycle`]: bulk opening of sessions for every pair in the yard
//! - [`approval`]: passphrase-gated replay of a finished audit onto the ledger
//! - [`divergence`]: read-only divergence predicates and reports
//!
//! All persistence goes through the `rodstock-infra` store ports; nothing here
//! holds global state.

pub mod approval;
pub mod cycle;
pub mod divergence;
pub mod engine;
pub mod error;
pub mod prompt;

#[cfg(test)]
pub(crate) mod testing;

pub use approval::{ApprovalGate, ApprovalReport, ReplayKey};
pub use divergence::{
    CriticalItem, ReportLine, SessionReport, critical_items, is_divergent, session_is_divergent,
    session_report,
};
pub use engine::{AuditEngine, AuditSession, CountFeedback, DraftCount, PairOverview, QuickAddLot};
pub use error::{AuditError, AuditResult};
pub use prompt::{FixedPrompt, OperatorPrompt};
