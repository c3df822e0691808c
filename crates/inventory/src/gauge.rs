//! Wire gauge ("bitola") as a fixed-point value.
//!
//! Gauges arrive as free-form decimal strings ("6", "6.0", "6.00", "6,3"). They
//! are canonicalized to integer hundredths of a millimetre so that every string
//! spelling of the same number compares equal. The two-digit string form
//! ("6.00") is only used at serialization boundaries.

use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use rodstock_core::{DomainError, DomainResult};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "GaugeRepr", into = "String")]
pub struct Gauge {
    hundredths: u32,
}

impl Gauge {
    pub const fn from_hundredths(hundredths: u32) -> Self {
        Self { hundredths }
    }

    pub fn hundredths(&self) -> u32 {
        self.hundredths
    }

    /// Parse a gauge string, accepting `.` or `,` as decimal separator.
    ///
    /// More than two fraction digits are rounded half away from zero.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let text = raw.trim().replace(',', ".");
        if text.is_empty() {
            return Err(DomainError::validation("gauge cannot be empty"));
        }
        let value = Decimal::from_str(&text)
            .map_err(|e| DomainError::validation(format!("invalid gauge '{raw}': {e}")))?;
        Self::from_decimal(value)
    }

    pub fn from_decimal(value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::validation(format!("gauge cannot be negative: {value}")));
        }
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let hundredths = (rounded * Decimal::ONE_HUNDRED)
            .to_u32()
            .ok_or_else(|| DomainError::validation(format!("gauge out of range: {value}")))?;
        Ok(Self { hundredths })
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(i64::from(self.hundredths), 2)
    }
}

/// Canonical two-fraction-digit form of a gauge string.
///
/// `normalize("6.0") == normalize("6.00") == "6.00"`.
pub fn normalize(raw: &str) -> DomainResult<String> {
    Gauge::parse(raw).map(|g| g.to_string())
}

impl core::fmt::Display for Gauge {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.hundredths / 100, self.hundredths % 100)
    }
}

impl FromStr for Gauge {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Gauge> for String {
    fn from(value: Gauge) -> Self {
        value.to_string()
    }
}

/// Wire forms accepted on input: a string or a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum GaugeRepr {
    Text(String),
    Number(f64),
}

impl TryFrom<GaugeRepr> for Gauge {
    type Error = DomainError;

    fn try_from(value: GaugeRepr) -> Result<Self, Self::Error> {
        match value {
            GaugeRepr::Text(s) => Gauge::parse(&s),
            GaugeRepr::Number(n) => {
                let d = Decimal::try_from(n)
                    .map_err(|e| DomainError::validation(format!("invalid gauge {n}: {e}")))?;
                Gauge::from_decimal(d)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn spellings_of_the_same_number_normalize_equal() {
        assert_eq!(normalize("6.0").unwrap(), "6.00");
        assert_eq!(normalize("6.00").unwrap(), "6.00");
        assert_eq!(normalize("6").unwrap(), "6.00");
        assert_eq!(normalize(" 6,3 ").unwrap(), "6.30");
        assert_eq!(Gauge::parse("12.5").unwrap(), Gauge::from_hundredths(1250));
    }

    #[test]
    fn extra_fraction_digits_round_half_away_from_zero() {
        assert_eq!(normalize("4.205").unwrap(), "4.21");
        assert_eq!(normalize("4.204").unwrap(), "4.20");
    }

    #[test]
    fn rejects_garbage_and_negative_values() {
        assert!(Gauge::parse("").is_err());
        assert!(Gauge::parse("abc").is_err());
        assert!(Gauge::parse("-6.0").is_err());
    }

    #[test]
    fn serde_uses_two_digit_string_and_accepts_numbers() {
        let g = Gauge::parse("8").unwrap();
        assert_eq!(serde_json::to_value(g).unwrap(), serde_json::json!("8.00"));

        let from_text: Gauge = serde_json::from_value(serde_json::json!("8.0")).unwrap();
        let from_number: Gauge = serde_json::from_value(serde_json::json!(8.0)).unwrap();
        assert_eq!(from_text, g);
        assert_eq!(from_number, g);
    }

    proptest! {
        #[test]
        fn trailing_zeros_do_not_change_gauge(whole in 0u32..10_000u32, frac in 0u32..100u32) {
            let short = format!("{whole}.{frac:02}");
            let long = format!("{whole}.{frac:02}000");
            prop_assert_eq!(normalize(&short).unwrap(), normalize(&long).unwrap());
            prop_assert_eq!(Gauge::parse(&short).unwrap().hundredths(), whole * 100 + frac);
        }

        #[test]
        fn display_reparses_to_same_gauge(hundredths in 0u32..1_000_000u32) {
            let g = Gauge::from_hundredths(hundredths);
            prop_assert_eq!(Gauge::parse(&g.to_string()).unwrap(), g);
        }
    }
}
