//! Shared account mutations used by all three transaction engines: fund
//! reservation at create time, release/credit at terminal transition.

use ledger_core::{CheckingAccount, CurrencyUnit, Decimal, LedgerError};
use ledger_store::keys::account_key;
use sled::transaction::{ConflictableTransactionError, TransactionalTree};

use crate::ttree::{abort, get_typed, put_typed};

/// `get_or_create(holder, unit)` (spec.md §3) — inside the caller's
/// transaction so a race against a concurrent creator resolves via the
/// store's own conflict retry, not an in-process lock.
pub fn get_or_create_account(
    accounts: &TransactionalTree,
    holder_id: &str,
    currency_unit: &str,
) -> Result<CheckingAccount, ConflictableTransactionError<LedgerError>> {
    let key = account_key(holder_id, currency_unit);
    if let Some(account) = get_typed::<CheckingAccount>(accounts, &key)? {
        return Ok(account);
    }
    let account = CheckingAccount::new(holder_id, currency_unit);
    put_typed(accounts, &key, &account)?;
    Ok(account)
}

pub fn get_account(
    accounts: &TransactionalTree,
    holder_id: &str,
    currency_unit: &str,
) -> Result<Option<CheckingAccount>, ConflictableTransactionError<LedgerError>> {
    get_typed(accounts, &account_key(holder_id, currency_unit))
}

/// Reserve `magnitude` (always positive) against `(holder_id, currency_unit)`
/// at create time for a debit-shaped operation (spec.md §4.2: "Debit …
/// decreased … *reserving* funds"). Re-reads the authoritative row —
/// callers must not pass a row read outside this transaction.
pub fn reserve(
    accounts: &TransactionalTree,
    unit: &CurrencyUnit,
    holder_id: &str,
    currency_unit: &str,
    magnitude: Decimal,
) -> Result<(), ConflictableTransactionError<LedgerError>> {
    let key = account_key(holder_id, currency_unit);
    let mut account = match get_typed::<CheckingAccount>(accounts, &key)? {
        Some(a) => a,
        None => return abort(LedgerError::not_found("checking account not found")),
    };

    if !unit.is_negative_allowed && account.amount.inner() < magnitude.inner() {
        return abort(LedgerError::validation(format!(
            "Insufficient funds: have {}, need {}",
            account.amount, magnitude
        )));
    }

    account.amount = match account.amount.checked_sub(magnitude) {
        Some(a) => a,
        None => return abort(LedgerError::validation("amount overflow during reservation")),
    };
    put_typed(accounts, &key, &account)?;
    Ok(())
}

/// Credit `amount` (always positive) onto `(holder_id, currency_unit)` —
/// used both for materialising a confirmed credit and for returning a
/// reserved debit on reject.
pub fn credit(
    accounts: &TransactionalTree,
    holder_id: &str,
    currency_unit: &str,
    amount: Decimal,
) -> Result<(), ConflictableTransactionError<LedgerError>> {
    let key = account_key(holder_id, currency_unit);
    let mut account = match get_typed::<CheckingAccount>(accounts, &key)? {
        Some(a) => a,
        None => CheckingAccount::new(holder_id, currency_unit),
    };
    account.amount = match account.amount.checked_add(amount) {
        Some(a) => a,
        None => return abort(LedgerError::validation("amount overflow during credit")),
    };
    put_typed(accounts, &key, &account)?;
    Ok(())
}
