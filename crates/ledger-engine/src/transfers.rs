//! Same-unit, between-account movement with a configurable fee (spec.md §4.3).

use chrono::Utc;
use ledger_core::{Decimal, LedgerError, Timestamp, TransactionHeader, TransactionStatus, TransferTransaction};
use ledger_store::{with_serializable_tx2, Store};
use uuid::Uuid;

use crate::accounts::{credit, reserve};
use crate::ttree::{abort, get_typed, put_typed};

pub fn create(
    store: &Store,
    service_name: &str,
    rule_name: &str,
    from_holder_id: &str,
    to_holder_id: &str,
    from_amount: Decimal,
    description: &str,
    auto_reject_after: Timestamp,
) -> Result<TransferTransaction, LedgerError> {
    let rule = store
        .get_transfer_rule(rule_name)?
        .ok_or_else(|| LedgerError::not_found(format!("unknown transfer rule {rule_name}")))?;
    if !rule.enabled {
        return Err(LedgerError::validation("Transfer rule is disabled"));
    }
    if from_holder_id == to_holder_id {
        return Err(LedgerError::validation("fromAccount and toAccount must differ"));
    }
    let unit = store
        .get_currency_unit(&rule.unit)?
        .ok_or_else(|| LedgerError::not_found(format!("unknown currency unit {}", rule.unit)))?;

    store
        .get_account(from_holder_id, &rule.unit)?
        .ok_or_else(|| LedgerError::not_found("from account not found"))?;
    store
        .get_account(to_holder_id, &rule.unit)?
        .ok_or_else(|| LedgerError::not_found("to account not found"))?;

    if from_amount.inner() < rule.min_from_amount.inner() {
        return Err(LedgerError::validation(format!(
            "fromAmount {from_amount} is below the rule minimum {}",
            rule.min_from_amount
        )));
    }
    unit.check_precision(from_amount)?;

    let hundred = Decimal::from_i64(100);
    let keep_percent = hundred
        .checked_sub(rule.fee_percent)
        .ok_or_else(|| LedgerError::validation("feePercent out of range"))?;
    let gross = from_amount
        .checked_mul(keep_percent)
        .and_then(|v| v.checked_div(hundred))
        .ok_or_else(|| LedgerError::validation("could not compute transfer fee"))?;
    let to_amount = gross.quantize_floor(unit.precision);
    if !to_amount.is_positive() {
        return Err(LedgerError::validation("toAmount after fee must be positive"));
    }

    with_serializable_tx2(store.accounts(), store.transfers(), |accounts_tx, transfers_tx| {
        reserve(accounts_tx, &unit, from_holder_id, &rule.unit, from_amount)?;

        let header = TransactionHeader::new(service_name, description, auto_reject_after);
        let tx = TransferTransaction {
            header,
            transfer_rule: Some(rule.name.clone()),
            from_holder_id: from_holder_id.to_string(),
            to_holder_id: to_holder_id.to_string(),
            currency_unit: rule.unit.clone(),
            from_amount,
            to_amount,
        };
        put_typed(transfers_tx, tx.header.uuid.as_bytes(), &tx)?;
        Ok(tx)
    })
}

pub fn confirm(store: &Store, uuid: Uuid, status_description: &str) -> Result<TransferTransaction, LedgerError> {
    with_serializable_tx2(store.accounts(), store.transfers(), |accounts_tx, transfers_tx| {
        let mut tx = match get_typed::<TransferTransaction>(transfers_tx, uuid.as_bytes())? {
            Some(tx) => tx,
            None => return abort(LedgerError::not_found("transfer not found")),
        };
        tx.header
            .require_pending()
            .map_err(sled::transaction::ConflictableTransactionError::Abort)?;

        tx.header.close(TransactionStatus::Confirmed, status_description);
        credit(accounts_tx, &tx.to_holder_id, &tx.currency_unit, tx.to_amount)?;
        put_typed(transfers_tx, uuid.as_bytes(), &tx)?;
        Ok(tx)
    })
}

/// `reject` always returns the full `fromAmount`, never gated on sign —
/// unlike adjustments, `fromAmount ≥ 0` by schema (spec.md §9, open
/// question (a)).
pub fn reject(store: &Store, uuid: Uuid, status_description: &str) -> Result<TransferTransaction, LedgerError> {
    with_serializable_tx2(store.accounts(), store.transfers(), |accounts_tx, transfers_tx| {
        let mut tx = match get_typed::<TransferTransaction>(transfers_tx, uuid.as_bytes())? {
            Some(tx) => tx,
            None => return abort(LedgerError::not_found("transfer not found")),
        };
        tx.header
            .require_pending()
            .map_err(sled::transaction::ConflictableTransactionError::Abort)?;

        tx.header.close(TransactionStatus::Rejected, status_description);
        credit(accounts_tx, &tx.from_holder_id, &tx.currency_unit, tx.from_amount)?;
        put_typed(transfers_tx, uuid.as_bytes(), &tx)?;
        Ok(tx)
    })
}

pub fn reject_all_outdated(store: &Store, status_description: &str) -> Result<Vec<Uuid>, LedgerError> {
    let now = Utc::now();
    let candidates: Vec<Uuid> = store
        .iter_transfers()?
        .into_iter()
        .filter(|tx| tx.header.status == TransactionStatus::Pending && tx.header.auto_reject_after < now)
        .map(|tx| tx.header.uuid)
        .collect();

    let mut rejected = Vec::new();
    for uuid in candidates {
        match reject(store, uuid, status_description) {
            Ok(_) => rejected.push(uuid),
            Err(LedgerError::Validation { message, .. }) => {
                tracing::info!(%uuid, message, "skipped outdated transfer: validation failed");
            }
            Err(other) => return Err(other),
        }
    }
    Ok(rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{CheckingAccount, CurrencyUnit, Holder, TransferRule};
    use std::str::FromStr;

    fn setup() -> Store {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.put_holder(&Holder::new("from", "player")).unwrap();
        store.put_holder(&Holder::new("to", "player")).unwrap();
        store
            .put_currency_unit(&CurrencyUnit::new("GLD", "gold", 4).unwrap())
            .unwrap();

        let mut from_account = CheckingAccount::new("from", "GLD");
        from_account.amount = Decimal::from_str("200").unwrap();
        store.put_account(&from_account).unwrap();
        store.put_account(&CheckingAccount::new("to", "GLD")).unwrap();

        store
            .put_transfer_rule(&TransferRule {
                name: "standard".into(),
                unit: "GLD".into(),
                enabled: true,
                fee_percent: Decimal::from_str("10").unwrap(),
                min_from_amount: Decimal::from_str("10").unwrap(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .unwrap();
        store
    }

    #[test]
    fn fee_is_applied_and_floored() {
        let store = setup();
        let tx = create(&store, "svc", "standard", "from", "to", Decimal::from_str("100").unwrap(), "pay", Utc::now()).unwrap();
        assert_eq!(tx.to_amount, Decimal::from_str("90").unwrap());
        assert_eq!(store.get_account("from", "GLD").unwrap().unwrap().amount, Decimal::from_str("100").unwrap());

        confirm(&store, tx.header.uuid, "ok").unwrap();
        assert_eq!(store.get_account("to", "GLD").unwrap().unwrap().amount, Decimal::from_str("90").unwrap());
    }

    #[test]
    fn reject_returns_full_from_amount() {
        let store = setup();
        let tx = create(&store, "svc", "standard", "from", "to", Decimal::from_str("100").unwrap(), "pay", Utc::now()).unwrap();
        reject(&store, tx.header.uuid, "nope").unwrap();
        assert_eq!(store.get_account("from", "GLD").unwrap().unwrap().amount, Decimal::from_str("200").unwrap());
    }

    #[test]
    fn below_minimum_from_amount_is_rejected() {
        let store = setup();
        let err = create(&store, "svc", "standard", "from", "to", Decimal::from_str("5").unwrap(), "pay", Utc::now());
        assert!(matches!(err, Err(LedgerError::Validation { .. })));
    }

    #[test]
    fn same_holder_transfer_is_rejected() {
        let store = setup();
        let err = create(&store, "svc", "standard", "from", "from", Decimal::from_str("50").unwrap(), "pay", Utc::now());
        assert!(err.is_err());
    }
}
