//! Cross-unit movement between two accounts of the same holder under a
//! configured rate (spec.md §4.4).

use chrono::Utc;
use ledger_core::{Decimal, ExchangeDirection, ExchangeTransaction, LedgerError, Timestamp, TransactionHeader, TransactionStatus};
use ledger_store::{with_serializable_tx2, Store};
use uuid::Uuid;

use crate::accounts::{credit, reserve};
use crate::ttree::{abort, get_typed, put_typed};

pub fn create(
    store: &Store,
    service_name: &str,
    holder_id: &str,
    rule_name: &str,
    from_unit: &str,
    to_unit: &str,
    from_amount: Decimal,
    description: &str,
    auto_reject_after: Timestamp,
) -> Result<ExchangeTransaction, LedgerError> {
    let rule = store
        .get_exchange_rule(rule_name)?
        .ok_or_else(|| LedgerError::not_found(format!("unknown exchange rule {rule_name}")))?;
    let direction = rule.direction(from_unit, to_unit)?;
    match direction {
        ExchangeDirection::Forward if !rule.enabled_forward => {
            return Err(LedgerError::validation("Forward exchange is disabled for this rule"))
        }
        ExchangeDirection::Reverse if !rule.enabled_reverse => {
            return Err(LedgerError::validation("Reverse exchange is disabled for this rule"))
        }
        _ => {}
    }

    let from_currency = store
        .get_currency_unit(from_unit)?
        .ok_or_else(|| LedgerError::not_found(format!("unknown currency unit {from_unit}")))?;
    let to_currency = store
        .get_currency_unit(to_unit)?
        .ok_or_else(|| LedgerError::not_found(format!("unknown currency unit {to_unit}")))?;
    from_currency.check_precision(from_amount)?;

    let min_amount = match direction {
        ExchangeDirection::Forward => rule.min_first_amount,
        ExchangeDirection::Reverse => rule.min_second_amount,
    };
    if from_amount.inner() < min_amount.inner() {
        return Err(LedgerError::validation(format!(
            "fromAmount {from_amount} is below the rule minimum {min_amount}"
        )));
    }

    let to_amount = match direction {
        ExchangeDirection::Forward => from_amount.checked_div(rule.forward_rate),
        ExchangeDirection::Reverse => from_amount.checked_mul(rule.reverse_rate),
    }
    .ok_or_else(|| LedgerError::validation("could not compute exchanged amount"))?;
    to_currency.check_precision(to_amount)?;

    store
        .get_account(holder_id, from_unit)?
        .ok_or_else(|| LedgerError::not_found("from account not found"))?;
    store
        .get_account(holder_id, to_unit)?
        .ok_or_else(|| LedgerError::not_found("to account not found"))?;

    with_serializable_tx2(store.accounts(), store.exchanges(), |accounts_tx, exchanges_tx| {
        reserve(accounts_tx, &from_currency, holder_id, from_unit, from_amount)?;

        let header = TransactionHeader::new(service_name, description, auto_reject_after);
        let tx = ExchangeTransaction {
            header,
            exchange_rule: Some(rule.name.clone()),
            holder_id: holder_id.to_string(),
            from_unit: from_unit.to_string(),
            to_unit: to_unit.to_string(),
            from_amount,
            to_amount,
        };
        put_typed(exchanges_tx, tx.header.uuid.as_bytes(), &tx)?;
        Ok(tx)
    })
}

pub fn confirm(store: &Store, uuid: Uuid, status_description: &str) -> Result<ExchangeTransaction, LedgerError> {
    with_serializable_tx2(store.accounts(), store.exchanges(), |accounts_tx, exchanges_tx| {
        let mut tx = match get_typed::<ExchangeTransaction>(exchanges_tx, uuid.as_bytes())? {
            Some(tx) => tx,
            None => return abort(LedgerError::not_found("exchange not found")),
        };
        tx.header
            .require_pending()
            .map_err(sled::transaction::ConflictableTransactionError::Abort)?;

        tx.header.close(TransactionStatus::Confirmed, status_description);
        credit(accounts_tx, &tx.holder_id, &tx.to_unit, tx.to_amount)?;
        put_typed(exchanges_tx, uuid.as_bytes(), &tx)?;
        Ok(tx)
    })
}

/// As with transfers, `reject` returns the full `fromAmount` unconditionally.
pub fn reject(store: &Store, uuid: Uuid, status_description: &str) -> Result<ExchangeTransaction, LedgerError> {
    with_serializable_tx2(store.accounts(), store.exchanges(), |accounts_tx, exchanges_tx| {
        let mut tx = match get_typed::<ExchangeTransaction>(exchanges_tx, uuid.as_bytes())? {
            Some(tx) => tx,
            None => return abort(LedgerError::not_found("exchange not found")),
        };
        tx.header
            .require_pending()
            .map_err(sled::transaction::ConflictableTransactionError::Abort)?;

        tx.header.close(TransactionStatus::Rejected, status_description);
        credit(accounts_tx, &tx.holder_id, &tx.from_unit, tx.from_amount)?;
        put_typed(exchanges_tx, uuid.as_bytes(), &tx)?;
        Ok(tx)
    })
}

pub fn reject_all_outdated(store: &Store, status_description: &str) -> Result<Vec<Uuid>, LedgerError> {
    let now = Utc::now();
    let candidates: Vec<Uuid> = store
        .iter_exchanges()?
        .into_iter()
        .filter(|tx| tx.header.status == TransactionStatus::Pending && tx.header.auto_reject_after < now)
        .map(|tx| tx.header.uuid)
        .collect();

    let mut rejected = Vec::new();
    for uuid in candidates {
        match reject(store, uuid, status_description) {
            Ok(_) => rejected.push(uuid),
            Err(LedgerError::Validation { message, .. }) => {
                tracing::info!(%uuid, message, "skipped outdated exchange: validation failed");
            }
            Err(other) => return Err(other),
        }
    }
    Ok(rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{CheckingAccount, CurrencyUnit, ExchangeRule, Holder};
    use std::str::FromStr;

    fn setup() -> Store {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.put_holder(&Holder::new("p1", "player")).unwrap();
        store.put_currency_unit(&CurrencyUnit::new("P", "first", 0).unwrap()).unwrap();
        store.put_currency_unit(&CurrencyUnit::new("Q", "second", 0).unwrap()).unwrap();

        let mut p_account = CheckingAccount::new("p1", "P");
        p_account.amount = Decimal::from_str("500").unwrap();
        store.put_account(&p_account).unwrap();
        store.put_account(&CheckingAccount::new("p1", "Q")).unwrap();

        store
            .put_exchange_rule(&ExchangeRule {
                name: "pq".into(),
                first_unit: "P".into(),
                second_unit: "Q".into(),
                forward_rate: Decimal::from_str("10").unwrap(),
                reverse_rate: Decimal::from_str("0.1").unwrap(),
                min_first_amount: Decimal::from_str("1").unwrap(),
                min_second_amount: Decimal::from_str("1").unwrap(),
                enabled_forward: true,
                enabled_reverse: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .unwrap();
        store
    }

    #[test]
    fn forward_exchange_divides_by_rate() {
        let store = setup();
        let tx = create(&store, "svc", "p1", "pq", "P", "Q", Decimal::from_str("100").unwrap(), "swap", Utc::now()).unwrap();
        assert_eq!(tx.to_amount, Decimal::from_str("10").unwrap());

        confirm(&store, tx.header.uuid, "ok").unwrap();
        assert_eq!(store.get_account("p1", "P").unwrap().unwrap().amount, Decimal::from_str("400").unwrap());
        assert_eq!(store.get_account("p1", "Q").unwrap().unwrap().amount, Decimal::from_str("10").unwrap());
    }

    #[test]
    fn non_integer_result_violates_zero_precision_unit() {
        let store = setup();
        let err = create(&store, "svc", "p1", "pq", "P", "Q", Decimal::from_str("5").unwrap(), "swap", Utc::now());
        assert!(matches!(err, Err(LedgerError::Validation { .. })));
    }

    #[test]
    fn disabled_direction_is_rejected() {
        let store = setup();
        let mut rule = store.get_exchange_rule("pq").unwrap().unwrap();
        rule.enabled_reverse = false;
        store.put_exchange_rule(&rule).unwrap();

        let err = create(&store, "svc", "p1", "pq", "Q", "P", Decimal::from_str("10").unwrap(), "swap", Utc::now());
        assert!(err.is_err());
    }
}
