//! Byte-key encodings for composite-key trees.

/// `(holder_id, currency_unit)` — the checking account composite key
/// (spec.md §3, "unique `(holder, currencyUnit)`").
pub fn account_key(holder_id: &str, currency_unit: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(holder_id.len() + currency_unit.len() + 1);
    key.extend_from_slice(holder_id.as_bytes());
    key.push(0);
    key.extend_from_slice(currency_unit.as_bytes());
    key
}

pub fn uuid_key(uuid: &uuid::Uuid) -> [u8; 16] {
    *uuid.as_bytes()
}
