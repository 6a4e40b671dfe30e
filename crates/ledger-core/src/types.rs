//! Fixed-point decimal and identifier primitives shared by every entity.
//!
//! Amounts are never `f64`: [`Decimal`] wraps `rust_decimal::Decimal` and
//! enforces the ledger-wide limit of 13 significant digits / 4 fractional
//! digits at construction time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::Zero;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

/// Unix-anchored UTC timestamp used for every `created_at`/`closed_at`/
/// `auto_reject_after` field.
pub type Timestamp = DateTime<Utc>;

/// Maximum significant digits a ledger amount may carry.
pub const MAX_SIGNIFICANT_DIGITS: u32 = 13;

/// Maximum fractional digits a ledger amount may carry (before any
/// per-unit precision is applied on top).
pub const MAX_FRACTIONAL_DIGITS: u32 = 4;

/// A fixed-point monetary amount: up to 13 significant digits, up to 4
/// fractional digits. Arithmetic is exact (`rust_decimal`); there is no
/// lossy path to or from a binary float anywhere in this type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "DecimalWire", into = "DecimalWire")]
pub struct Decimal(rust_decimal::Decimal);

/// Wire representation: a JSON string, parsed permissively from a string or
/// a bare JSON number (spec §6.3).
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DecimalWire {
    Str(String),
    Num(rust_decimal::Decimal),
}

impl TryFrom<DecimalWire> for Decimal {
    type Error = String;

    fn try_from(wire: DecimalWire) -> Result<Self, Self::Error> {
        let inner = match wire {
            DecimalWire::Str(s) => {
                rust_decimal::Decimal::from_str(s.trim()).map_err(|e| e.to_string())?
            }
            DecimalWire::Num(d) => d,
        };
        Decimal::new(inner).map_err(|e| e.to_string())
    }
}

impl From<Decimal> for DecimalWire {
    fn from(d: Decimal) -> Self {
        DecimalWire::Str(d.to_wire_string())
    }
}

impl Decimal {
    pub const ZERO: Decimal = Decimal(rust_decimal::Decimal::ZERO);

    /// Build a `Decimal`, rejecting values that exceed the ledger-wide
    /// precision ceiling (13 significant digits, 4 fractional digits).
    pub fn new(value: rust_decimal::Decimal) -> Result<Self, String> {
        let value = value.normalize();
        if value.scale() > MAX_FRACTIONAL_DIGITS {
            return Err(format!(
                "amount {value} has more than {MAX_FRACTIONAL_DIGITS} fractional digits"
            ));
        }
        let digits = value.mantissa().unsigned_abs().to_string().len() as u32;
        if digits > MAX_SIGNIFICANT_DIGITS {
            return Err(format!(
                "amount {value} has more than {MAX_SIGNIFICANT_DIGITS} significant digits"
            ));
        }
        Ok(Decimal(value))
    }

    pub fn from_i64(v: i64) -> Self {
        Decimal(rust_decimal::Decimal::from(v))
    }

    pub fn inner(&self) -> rust_decimal::Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn abs(&self) -> Decimal {
        Decimal(self.0.abs())
    }

    pub fn neg(&self) -> Decimal {
        Decimal(-self.0)
    }

    /// Number of digits after the decimal point in the *normalised*
    /// (trailing-zero-stripped) representation — the quantity spec.md's
    /// precision checks compare against a unit's precision.
    pub fn fractional_digits(&self) -> u32 {
        self.0.normalize().scale()
    }

    pub fn checked_add(&self, other: Decimal) -> Option<Decimal> {
        self.0.checked_add(other.0).and_then(|v| Decimal::new(v).ok())
    }

    pub fn checked_sub(&self, other: Decimal) -> Option<Decimal> {
        self.0.checked_sub(other.0).and_then(|v| Decimal::new(v).ok())
    }

    pub fn checked_mul(&self, other: Decimal) -> Option<Decimal> {
        self.0.checked_mul(other.0).and_then(|v| Decimal::new(v).ok())
    }

    pub fn checked_div(&self, other: Decimal) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        self.0.checked_div(other.0).and_then(|v| Decimal::new(v).ok())
    }

    /// Round down (`ROUND_DOWN`/truncate-toward-zero) to `precision`
    /// fractional digits, matching the transfer-fee rounding rule in
    /// spec.md §4.3.
    pub fn quantize_floor(&self, precision: u32) -> Decimal {
        let rounded = self
            .0
            .round_dp_with_strategy(precision, RoundingStrategy::ToZero);
        Decimal(rounded.normalize())
    }

    fn to_wire_string(self) -> String {
        // `rust_decimal`'s Display already omits trailing zeros once
        // normalised, matching spec.md §6.3 ("no trailing zeros except
        // when required by precision").
        self.0.to_string()
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({})", self.0)
    }
}

impl FromStr for Decimal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = rust_decimal::Decimal::from_str(s).map_err(|e| e.to_string())?;
        Decimal::new(inner)
    }
}

/// Opaque, externally-assigned identifier for a [`crate::holder::Holder`].
pub type HolderId = String;

/// Transaction primary key: a random v4 UUID (spec.md §3).
pub type TxUuid = uuid::Uuid;

pub fn new_tx_uuid() -> TxUuid {
    uuid::Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_too_many_fractional_digits() {
        assert!(Decimal::new(dec!(1.23456)).is_err());
    }

    #[test]
    fn rejects_too_many_significant_digits() {
        assert!(Decimal::new(dec!(12345678901234)).is_err());
    }

    #[test]
    fn normalizes_trailing_zeros() {
        let d = Decimal::new(dec!(100.0000)).unwrap();
        assert_eq!(d.fractional_digits(), 0);
        assert_eq!(d.to_string(), "100");
    }

    #[test]
    fn quantize_floor_truncates() {
        let d = Decimal::new(dec!(90.999)).unwrap();
        assert_eq!(d.quantize_floor(0).to_string(), "90");
    }

    #[test]
    fn wire_roundtrip_from_string_and_number() {
        let from_str: Decimal = serde_json::from_str("\"12.5000\"").unwrap();
        let from_num: Decimal = serde_json::from_str("12.5").unwrap();
        assert_eq!(from_str, from_num);
    }
}
