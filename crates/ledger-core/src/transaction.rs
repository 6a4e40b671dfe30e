//! The transaction state machine and its three concrete shapes
//! (spec.md §3, §9 — "share only the state-machine fields, not a
//! polymorphic base row").

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::{new_tx_uuid, Decimal, Timestamp, TxUuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

/// Fields shared by every transaction kind. Embedded by value in each
/// concrete transaction, not a shared storage row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionHeader {
    pub uuid: TxUuid,
    pub service_name: String,
    pub description: String,
    pub status_description: String,
    pub status: TransactionStatus,
    pub auto_reject_after: Timestamp,
    pub created_at: Timestamp,
    pub closed_at: Option<Timestamp>,
}

impl TransactionHeader {
    pub fn new(service_name: impl Into<String>, description: impl Into<String>, auto_reject_after: Timestamp) -> Self {
        TransactionHeader {
            uuid: new_tx_uuid(),
            service_name: service_name.into(),
            description: description.into(),
            status_description: String::new(),
            status: TransactionStatus::Pending,
            auto_reject_after,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    /// Gate shared by every `confirm`/`reject`: fails unless the transaction
    /// is still `PENDING` (spec.md §4.2, §8 "Terminality").
    pub fn require_pending(&self) -> Result<(), LedgerError> {
        if self.status != TransactionStatus::Pending {
            return Err(LedgerError::validation(format!(
                "transaction {} is not pending (status = {:?})",
                self.uuid, self.status
            )));
        }
        Ok(())
    }

    pub fn close(&mut self, status: TransactionStatus, status_description: impl Into<String>) {
        self.status = status;
        self.status_description = status_description.into();
        self.closed_at = Some(Utc::now());
    }
}

/// Single-account credit (`amount > 0`) or debit (`amount < 0`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdjustmentTransaction {
    pub header: TransactionHeader,
    pub holder_id: String,
    pub currency_unit: String,
    pub amount: Decimal,
}

/// Same-unit movement between two accounts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferTransaction {
    pub header: TransactionHeader,
    /// Weak reference: `None` once the originating rule is deleted (spec.md
    /// §3, `TransferRule`). The numeric outcome is unaffected.
    pub transfer_rule: Option<String>,
    pub from_holder_id: String,
    pub to_holder_id: String,
    pub currency_unit: String,
    pub from_amount: Decimal,
    pub to_amount: Decimal,
}

/// Cross-unit movement between two accounts of the same holder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExchangeTransaction {
    pub header: TransactionHeader,
    pub exchange_rule: Option<String>,
    pub holder_id: String,
    pub from_unit: String,
    pub to_unit: String,
    pub from_amount: Decimal,
    pub to_amount: Decimal,
}
