//! History events and saga step reporting.
//!
//! Stock lots keep an append-only history; every entry is an [`Event`].
//! Multi-record replays (e.g. applying an audit to the ledger) report their
//! progress through a [`SagaReport`].

pub mod event;
pub mod saga;

pub use event::Event;
pub use saga::{SagaOutcome, SagaReport, StepReport, StepStatus};
