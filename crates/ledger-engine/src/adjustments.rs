//! Single-account credits and debits (spec.md §4.2).

use chrono::Utc;
use ledger_core::{AdjustmentTransaction, Decimal, LedgerError, Timestamp, TransactionHeader, TransactionStatus};
use ledger_store::{with_serializable_tx2, Store};
use uuid::Uuid;

use crate::accounts::{credit, get_or_create_account, reserve};
use crate::ttree::{get_typed, put_typed};

pub fn create(
    store: &Store,
    service_name: &str,
    holder_id: &str,
    currency_unit: &str,
    amount: Decimal,
    description: &str,
    auto_reject_after: Timestamp,
) -> Result<AdjustmentTransaction, LedgerError> {
    if amount.is_zero() {
        return Err(LedgerError::validation_field("amount", "amount must not be zero"));
    }
    let unit = store
        .get_currency_unit(currency_unit)?
        .ok_or_else(|| LedgerError::not_found(format!("unknown currency unit {currency_unit}")))?;
    unit.check_precision(amount)?;

    with_serializable_tx2(store.accounts(), store.adjustments(), |accounts_tx, adjustments_tx| {
        get_or_create_account(accounts_tx, holder_id, currency_unit)?;
        if amount.is_negative() {
            reserve(accounts_tx, &unit, holder_id, currency_unit, amount.abs())?;
        }

        let header = TransactionHeader::new(service_name, description, auto_reject_after);
        let tx = AdjustmentTransaction {
            header,
            holder_id: holder_id.to_string(),
            currency_unit: currency_unit.to_string(),
            amount,
        };
        put_typed(adjustments_tx, tx.header.uuid.as_bytes(), &tx)?;
        Ok(tx)
    })
}

pub fn confirm(
    store: &Store,
    uuid: Uuid,
    status_description: &str,
) -> Result<AdjustmentTransaction, LedgerError> {
    with_serializable_tx2(store.accounts(), store.adjustments(), |accounts_tx, adjustments_tx| {
        let mut tx = match get_typed::<AdjustmentTransaction>(adjustments_tx, uuid.as_bytes())? {
            Some(tx) => tx,
            None => return crate::ttree::abort(LedgerError::not_found("adjustment not found")),
        };
        tx.header
            .require_pending()
            .map_err(sled::transaction::ConflictableTransactionError::Abort)?;

        tx.header.close(TransactionStatus::Confirmed, status_description);
        if tx.amount.is_positive() {
            credit(accounts_tx, &tx.holder_id, &tx.currency_unit, tx.amount)?;
        }
        put_typed(adjustments_tx, uuid.as_bytes(), &tx)?;
        Ok(tx)
    })
}

pub fn reject(
    store: &Store,
    uuid: Uuid,
    status_description: &str,
) -> Result<AdjustmentTransaction, LedgerError> {
    with_serializable_tx2(store.accounts(), store.adjustments(), |accounts_tx, adjustments_tx| {
        let mut tx = match get_typed::<AdjustmentTransaction>(adjustments_tx, uuid.as_bytes())? {
            Some(tx) => tx,
            None => return crate::ttree::abort(LedgerError::not_found("adjustment not found")),
        };
        tx.header
            .require_pending()
            .map_err(sled::transaction::ConflictableTransactionError::Abort)?;

        tx.header.close(TransactionStatus::Rejected, status_description);
        if tx.amount.is_negative() {
            credit(accounts_tx, &tx.holder_id, &tx.currency_unit, tx.amount.abs())?;
        }
        put_typed(adjustments_tx, uuid.as_bytes(), &tx)?;
        Ok(tx)
    })
}

/// `rejectAllOutdated` (spec.md §4.2): best-effort, logs and continues past
/// per-row `Validation` (e.g. a race against a concurrent confirm).
pub fn reject_all_outdated(store: &Store, status_description: &str) -> Result<Vec<Uuid>, LedgerError> {
    let now = Utc::now();
    let candidates: Vec<Uuid> = store
        .iter_adjustments()?
        .into_iter()
        .filter(|tx| tx.header.status == TransactionStatus::Pending && tx.header.auto_reject_after < now)
        .map(|tx| tx.header.uuid)
        .collect();

    let mut rejected = Vec::new();
    for uuid in candidates {
        match reject(store, uuid, status_description) {
            Ok(_) => rejected.push(uuid),
            Err(LedgerError::Validation { message, .. }) => {
                tracing::info!(%uuid, message, "skipped outdated adjustment: validation failed");
            }
            Err(other) => return Err(other),
        }
    }
    Ok(rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{CurrencyUnit, Holder};
    use std::str::FromStr;

    fn setup() -> Store {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.put_holder(&Holder::new("p1", "player")).unwrap();
        store
            .put_currency_unit(&CurrencyUnit::new("GLD", "gold", 4).unwrap())
            .unwrap();
        store
    }

    #[test]
    fn credit_confirm_materialises_at_confirm_time() {
        let store = setup();
        let amount = Decimal::from_str("100.0000").unwrap();
        let tx = create(&store, "svc", "p1", "GLD", amount, "grant", Utc::now()).unwrap();

        let account = store.get_account("p1", "GLD").unwrap().unwrap();
        assert!(account.amount.is_zero(), "credit must not land until confirm");

        confirm(&store, tx.header.uuid, "ok").unwrap();
        let account = store.get_account("p1", "GLD").unwrap().unwrap();
        assert_eq!(account.amount, amount);
    }

    #[test]
    fn debit_reject_restores_balance() {
        let store = setup();
        let mut seed = ledger_core::CheckingAccount::new("p1", "GLD");
        seed.amount = Decimal::from_str("100").unwrap();
        store.put_account(&seed).unwrap();

        let amount = Decimal::from_str("-30").unwrap();
        let tx = create(&store, "svc", "p1", "GLD", amount, "spend", Utc::now()).unwrap();
        assert_eq!(store.get_account("p1", "GLD").unwrap().unwrap().amount, Decimal::from_str("70").unwrap());

        reject(&store, tx.header.uuid, "reverted").unwrap();
        assert_eq!(store.get_account("p1", "GLD").unwrap().unwrap().amount, Decimal::from_str("100").unwrap());
    }

    #[test]
    fn insufficient_funds_is_rejected_without_mutation() {
        let store = setup();
        let mut seed = ledger_core::CheckingAccount::new("p1", "GLD");
        seed.amount = Decimal::from_str("50").unwrap();
        store.put_account(&seed).unwrap();

        let err = create(&store, "svc", "p1", "GLD", Decimal::from_str("-100").unwrap(), "spend", Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
        assert_eq!(store.get_account("p1", "GLD").unwrap().unwrap().amount, Decimal::from_str("50").unwrap());
    }

    #[test]
    fn confirming_a_terminal_transaction_fails() {
        let store = setup();
        let tx = create(&store, "svc", "p1", "GLD", Decimal::from_str("10").unwrap(), "grant", Utc::now()).unwrap();
        confirm(&store, tx.header.uuid, "ok").unwrap();
        let err = confirm(&store, tx.header.uuid, "again").unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
    }

    #[test]
    fn precision_beyond_unit_is_rejected() {
        let store = setup();
        store
            .put_currency_unit(&CurrencyUnit::new("SLV", "silver", 2).unwrap())
            .unwrap();
        let err = create(&store, "svc", "p1", "SLV", Decimal::from_str("1.234").unwrap(), "x", Utc::now());
        assert!(err.is_err());
    }
}
