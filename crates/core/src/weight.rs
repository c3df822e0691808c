//! Weight comparison rules shared by counting feedback and divergence reports.
//!
//! Weights are kilograms held as `Decimal` so that operator input such as `205.3`
//! is compared exactly, without binary floating point drift.

use rust_decimal::Decimal;

/// Kilograms.
pub type Kg = Decimal;

/// Tolerance between a physical count and the recorded weight (0.1 kg).
pub const AUDIT_TOLERANCE_KG: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// `true` when the two weights agree: `|physical - system| < 0.1`.
///
/// Used for the "ok" flag in operator counting feedback.
pub fn within_tolerance(physical: Kg, system: Kg) -> bool {
    (physical - system).abs() < AUDIT_TOLERANCE_KG
}

/// `true` when the two weights disagree: `|physical - system| > 0.1`.
///
/// Used by divergence reports. A difference of exactly 0.1 kg is neither "ok"
/// nor divergent.
pub fn exceeds_tolerance(physical: Kg, system: Kg) -> bool {
    (physical - system).abs() > AUDIT_TOLERANCE_KG
}
