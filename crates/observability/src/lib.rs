//! Process-wide tracing setup for the rodstock binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LOG_FORMAT_VAR, LogFormat};

/// Initialize tracing with the format named by `RODSTOCK_LOG_FORMAT` (JSON by default).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    let format = std::env::var(LOG_FORMAT_VAR)
        .map(|raw| LogFormat::parse(&raw))
        .unwrap_or_default();
    self::tracing::init(format);
}
