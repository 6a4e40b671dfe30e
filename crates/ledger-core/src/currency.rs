//! Currency denominations, balances, and the rules that govern movement
//! between them (spec.md §3).

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::{Decimal, HolderId, Timestamp};

/// A currency denomination. `precision` bounds how many fractional digits an
/// account or rule referencing this unit may carry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurrencyUnit {
    pub symbol: String,
    pub measurement: String,
    pub precision: u32,
    pub is_negative_allowed: bool,
}

impl CurrencyUnit {
    pub fn new(symbol: impl Into<String>, measurement: impl Into<String>, precision: u32) -> Result<Self, LedgerError> {
        if precision > 4 {
            return Err(LedgerError::validation_field(
                "precision",
                "precision must be between 0 and 4",
            ));
        }
        Ok(CurrencyUnit {
            symbol: symbol.into(),
            measurement: measurement.into(),
            precision,
            is_negative_allowed: false,
        })
    }

    /// Fails `Validation` if `amount` carries more fractional digits than
    /// this unit's precision allows.
    pub fn check_precision(&self, amount: Decimal) -> Result<(), LedgerError> {
        if amount.fractional_digits() > self.precision {
            return Err(LedgerError::validation_field(
                "amount",
                format!(
                    "amount has more fractional digits than unit {} allows (precision {})",
                    self.symbol, self.precision
                ),
            ));
        }
        Ok(())
    }
}

/// A balance of one unit held by one holder. Unique per `(holder_id,
/// currency_unit)`; created by `get_or_create`, never deleted while
/// transactions reference it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckingAccount {
    pub holder_id: HolderId,
    pub currency_unit: String,
    pub amount: Decimal,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CheckingAccount {
    pub fn new(holder_id: impl Into<String>, currency_unit: impl Into<String>) -> Self {
        let now = Utc::now();
        CheckingAccount {
            holder_id: holder_id.into(),
            currency_unit: currency_unit.into(),
            amount: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> (String, String) {
        (self.holder_id.clone(), self.currency_unit.clone())
    }
}

/// Policy for a same-unit transfer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferRule {
    pub name: String,
    pub unit: String,
    pub enabled: bool,
    /// 0-100, one fractional digit.
    pub fee_percent: Decimal,
    pub min_from_amount: Decimal,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Policy for a cross-unit exchange between exactly two units.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExchangeRule {
    pub name: String,
    pub first_unit: String,
    pub second_unit: String,
    pub forward_rate: Decimal,
    pub reverse_rate: Decimal,
    pub min_first_amount: Decimal,
    pub min_second_amount: Decimal,
    pub enabled_forward: bool,
    pub enabled_reverse: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ExchangeRule {
    pub fn units(&self) -> (&str, &str) {
        (&self.first_unit, &self.second_unit)
    }

    /// Direction of `from_unit -> to_unit`: forward when `from_unit` is the
    /// rule's `first_unit`, reverse when it is `second_unit`. Fails
    /// `Validation` if neither unit belongs to this rule, or they're equal.
    pub fn direction(&self, from_unit: &str, to_unit: &str) -> Result<ExchangeDirection, LedgerError> {
        if from_unit == to_unit {
            return Err(LedgerError::validation("from_unit and to_unit must differ"));
        }
        if from_unit == self.first_unit && to_unit == self.second_unit {
            Ok(ExchangeDirection::Forward)
        } else if from_unit == self.second_unit && to_unit == self.first_unit {
            Ok(ExchangeDirection::Reverse)
        } else {
            Err(LedgerError::validation(format!(
                "units {from_unit}/{to_unit} do not match exchange rule {}",
                self.name
            )))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeDirection {
    Forward,
    Reverse,
}
