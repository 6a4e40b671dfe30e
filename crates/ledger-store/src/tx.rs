//! The Persistence Gateway's transaction primitives (spec.md §4.1).
//!
//! `sled`'s multi-tree `transaction()` already retries a closure internally
//! on write conflicts; [`retry_on_serialization_conflict`] exists one layer
//! up, for operations (like the collapse procedure) that read outside a
//! single sled transaction and must redo that read on conflict — the same
//! role the source's `retry_on_serialization_error` decorator plays around
//! `transaction.atomic()`.

use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};

use ledger_core::LedgerError;

pub type TxResult<R> = Result<R, ConflictableTransactionError<LedgerError>>;

fn map_tx_error(err: TransactionError<LedgerError>) -> LedgerError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => LedgerError::Storage(e.to_string()),
    }
}

/// Run `f` as a single-tree serializable transaction.
pub fn with_serializable_tx1<R>(
    a: &sled::Tree,
    f: impl Fn(&sled::transaction::TransactionalTree) -> TxResult<R>,
) -> Result<R, LedgerError> {
    a.transaction(|ta| f(ta)).map_err(map_tx_error)
}

/// Run `f` as a two-tree serializable transaction.
pub fn with_serializable_tx2<R>(
    a: &sled::Tree,
    b: &sled::Tree,
    f: impl Fn(
        &sled::transaction::TransactionalTree,
        &sled::transaction::TransactionalTree,
    ) -> TxResult<R>,
) -> Result<R, LedgerError> {
    (a, b).transaction(|(ta, tb)| f(ta, tb)).map_err(map_tx_error)
}

/// Run `f` as a three-tree serializable transaction.
pub fn with_serializable_tx3<R>(
    a: &sled::Tree,
    b: &sled::Tree,
    c: &sled::Tree,
    f: impl Fn(
        &sled::transaction::TransactionalTree,
        &sled::transaction::TransactionalTree,
        &sled::transaction::TransactionalTree,
    ) -> TxResult<R>,
) -> Result<R, LedgerError> {
    (a, b, c)
        .transaction(|(ta, tb, tc)| f(ta, tb, tc))
        .map_err(map_tx_error)
}

/// Re-run `op` up to `max_retries` times while it reports
/// [`LedgerError::Conflict`]. Any other error, or exhaustion of the retry
/// budget, is returned to the caller. Mirrors the source's
/// `retry_on_serialization_error(max_retries)` decorator.
pub fn retry_on_serialization_conflict<R>(
    max_retries: u32,
    mut op: impl FnMut() -> Result<R, LedgerError>,
) -> Result<R, LedgerError> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(LedgerError::Conflict(msg)) => {
                attempt += 1;
                if attempt > max_retries {
                    return Err(LedgerError::Conflict(msg));
                }
                tracing::warn!(attempt, max_retries, "retrying after serialization conflict");
            }
            Err(other) => return Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retry_gives_up_after_max_retries() {
        let calls = Cell::new(0);
        let result: Result<(), LedgerError> = retry_on_serialization_conflict(2, || {
            calls.set(calls.get() + 1);
            Err(LedgerError::Conflict("busy".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn retry_stops_on_non_conflict_error() {
        let calls = Cell::new(0);
        let result: Result<(), LedgerError> = retry_on_serialization_conflict(5, || {
            calls.set(calls.get() + 1);
            Err(LedgerError::validation("bad amount"))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retry_succeeds_without_retrying_on_first_try() {
        let result = retry_on_serialization_conflict(3, || Ok::<_, LedgerError>(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn two_tree_transaction_commits_across_both_trees() {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path()).unwrap();
        let a = db.open_tree("a").unwrap();
        let b = db.open_tree("b").unwrap();

        let result = with_serializable_tx2(&a, &b, |ta, tb| {
            ta.insert(b"k1", b"v1")?;
            tb.insert(b"k2", b"v2")?;
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(a.get(b"k1").unwrap().unwrap(), b"v1");
        assert_eq!(b.get(b"k2").unwrap().unwrap(), b"v2");
    }
}
