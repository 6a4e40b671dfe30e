//! Compact old confirmed history into one summary adjustment per
//! `(service, account)` while preserving net balances (spec.md §4.6).

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use ledger_core::{new_tx_uuid, AdjustmentTransaction, Decimal, LedgerError, TransactionHeader, TransactionStatus};
use ledger_store::{retry_on_serialization_conflict, with_serializable_tx3, Store};

use crate::ttree::put_typed;

const COLLAPSED_DESCRIPTION: &str = "The amount of old collapsed transactions";

/// `collapseOldTransactions(olderThan, serviceNames)`. Retries each
/// service's delete-and-insert transaction up to `max_retries` times on a
/// serialization conflict (spec.md §7: collapse retries up to 5 times).
pub fn collapse_old_transactions(
    store: &Store,
    older_than: Duration,
    service_names: &[String],
    max_retries: u32,
) -> Result<Vec<AdjustmentTransaction>, LedgerError> {
    let cutoff = Utc::now() - older_than;
    let mut created = Vec::new();
    for service_name in service_names {
        let mut rows = retry_on_serialization_conflict(max_retries, || {
            collapse_one_service(store, service_name, cutoff)
        })?;
        created.append(&mut rows);
    }
    Ok(created)
}

fn accumulate(
    net: &mut BTreeMap<(String, String), Decimal>,
    holder_id: &str,
    currency_unit: &str,
    delta: Decimal,
) -> Result<(), LedgerError> {
    let key = (holder_id.to_string(), currency_unit.to_string());
    let updated = match net.get(&key) {
        Some(current) => current
            .checked_add(delta)
            .ok_or_else(|| LedgerError::validation("collapse net amount overflow"))?,
        None => delta,
    };
    net.insert(key, updated);
    Ok(())
}

fn collapse_one_service(
    store: &Store,
    service_name: &str,
    cutoff: DateTime<Utc>,
) -> Result<Vec<AdjustmentTransaction>, LedgerError> {
    let old_adjustments: Vec<_> = store
        .iter_adjustments()?
        .into_iter()
        .filter(|tx| is_collapsible(&tx.header, service_name, cutoff))
        .collect();
    let old_transfers: Vec<_> = store
        .iter_transfers()?
        .into_iter()
        .filter(|tx| is_collapsible(&tx.header, service_name, cutoff))
        .collect();
    let old_exchanges: Vec<_> = store
        .iter_exchanges()?
        .into_iter()
        .filter(|tx| is_collapsible(&tx.header, service_name, cutoff))
        .collect();

    if old_adjustments.is_empty() && old_transfers.is_empty() && old_exchanges.is_empty() {
        return Ok(Vec::new());
    }

    let mut net: BTreeMap<(String, String), Decimal> = BTreeMap::new();
    for tx in &old_adjustments {
        accumulate(&mut net, &tx.holder_id, &tx.currency_unit, tx.amount)?;
    }
    for tx in &old_transfers {
        accumulate(&mut net, &tx.to_holder_id, &tx.currency_unit, tx.to_amount)?;
        accumulate(&mut net, &tx.from_holder_id, &tx.currency_unit, tx.from_amount.neg())?;
    }
    for tx in &old_exchanges {
        accumulate(&mut net, &tx.holder_id, &tx.to_unit, tx.to_amount)?;
        accumulate(&mut net, &tx.holder_id, &tx.from_unit, tx.from_amount.neg())?;
    }

    let now = Utc::now();
    with_serializable_tx3(
        store.adjustments(),
        store.transfers(),
        store.exchanges(),
        |adj_tree, transfer_tree, exchange_tree| {
            for tx in &old_adjustments {
                adj_tree.remove(tx.header.uuid.as_bytes())?;
            }
            for tx in &old_transfers {
                transfer_tree.remove(tx.header.uuid.as_bytes())?;
            }
            for tx in &old_exchanges {
                exchange_tree.remove(tx.header.uuid.as_bytes())?;
            }

            let mut created = Vec::new();
            for ((holder_id, currency_unit), amount) in &net {
                if amount.is_zero() {
                    continue;
                }
                let header = TransactionHeader {
                    uuid: new_tx_uuid(),
                    service_name: service_name.to_string(),
                    description: COLLAPSED_DESCRIPTION.to_string(),
                    status_description: String::new(),
                    status: TransactionStatus::Confirmed,
                    auto_reject_after: now,
                    created_at: cutoff,
                    closed_at: Some(now),
                };
                let tx = AdjustmentTransaction {
                    header,
                    holder_id: holder_id.clone(),
                    currency_unit: currency_unit.clone(),
                    amount: *amount,
                };
                put_typed(adj_tree, tx.header.uuid.as_bytes(), &tx)?;
                created.push(tx);
            }
            Ok(created)
        },
    )
}

fn is_collapsible(
    header: &ledger_core::TransactionHeader,
    service_name: &str,
    cutoff: DateTime<Utc>,
) -> bool {
    header.service_name == service_name && header.status != TransactionStatus::Pending && header.created_at < cutoff
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{AdjustmentTransaction, CheckingAccount, CurrencyUnit, Holder};
    use std::str::FromStr;

    fn setup() -> Store {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.put_holder(&Holder::new("p1", "player")).unwrap();
        store.put_currency_unit(&CurrencyUnit::new("GLD", "gold", 4).unwrap()).unwrap();
        store
    }

    fn confirmed_adjustment(service: &str, holder: &str, unit: &str, amount: Decimal, created_at: DateTime<Utc>) -> AdjustmentTransaction {
        AdjustmentTransaction {
            header: TransactionHeader {
                uuid: new_tx_uuid(),
                service_name: service.to_string(),
                description: "seed".to_string(),
                status_description: "ok".to_string(),
                status: TransactionStatus::Confirmed,
                auto_reject_after: created_at,
                created_at,
                closed_at: Some(created_at),
            },
            holder_id: holder.to_string(),
            currency_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn collapse_preserves_balance_and_reduces_row_count() {
        let store = setup();
        let old_time = Utc::now() - Duration::days(400);
        let recent_time = Utc::now() - Duration::days(1);

        for _ in 0..3 {
            store
                .put_adjustment(&confirmed_adjustment("svc", "p1", "GLD", Decimal::from_str("100").unwrap(), old_time))
                .unwrap();
        }
        store
            .put_adjustment(&confirmed_adjustment("svc", "p1", "GLD", Decimal::from_str("100").unwrap(), recent_time))
            .unwrap();

        let mut account = CheckingAccount::new("p1", "GLD");
        account.amount = Decimal::from_str("400").unwrap();
        store.put_account(&account).unwrap();

        let created = collapse_old_transactions(&store, Duration::days(365), &["svc".to_string()], 5).unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].amount, Decimal::from_str("300").unwrap());

        let remaining = store.iter_adjustments().unwrap();
        assert_eq!(remaining.len(), 2, "3 old rows collapse to 1, the recent row is untouched");

        assert_eq!(store.get_account("p1", "GLD").unwrap().unwrap().amount, Decimal::from_str("400").unwrap());
    }

    #[test]
    fn no_old_rows_is_a_no_op() {
        let store = setup();
        let created = collapse_old_transactions(&store, Duration::days(365), &["svc".to_string()], 5).unwrap();
        assert!(created.is_empty());
    }
}
