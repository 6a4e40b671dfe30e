//! Typed bincode access on top of `sled`'s in-transaction tree handle,
//! mirroring `ledger_store::db`'s outside-transaction helpers.

use ledger_core::LedgerError;
use sled::transaction::{ConflictableTransactionError, TransactionalTree};

pub fn get_typed<T: serde::de::DeserializeOwned>(
    tree: &TransactionalTree,
    key: &[u8],
) -> Result<Option<T>, ConflictableTransactionError<LedgerError>> {
    match tree.get(key)? {
        Some(bytes) => {
            let value = bincode::deserialize(&bytes).map_err(|e| {
                ConflictableTransactionError::Abort(LedgerError::Storage(e.to_string()))
            })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub fn put_typed<T: serde::Serialize>(
    tree: &TransactionalTree,
    key: &[u8],
    value: &T,
) -> Result<(), ConflictableTransactionError<LedgerError>> {
    let bytes = bincode::serialize(value).map_err(|e| {
        ConflictableTransactionError::Abort(LedgerError::Storage(e.to_string()))
    })?;
    tree.insert(key, bytes)?;
    Ok(())
}

pub fn abort<R>(err: LedgerError) -> Result<R, ConflictableTransactionError<LedgerError>> {
    Err(ConflictableTransactionError::Abort(err))
}
