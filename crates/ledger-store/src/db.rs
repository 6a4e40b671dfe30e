use std::path::Path;

use ledger_core::{
    AdjustmentTransaction, CheckingAccount, CurrencyService, CurrencyUnit, ExchangeRule,
    ExchangeTransaction, Holder, HolderType, LedgerError, ServiceAuth, TransferRule,
    TransferTransaction,
};

use crate::keys::account_key;

/// Persistent ledger state backed by sled (pure-Rust, no C dependencies).
///
/// Named trees, one per entity:
///   services           — name utf8            → bincode(CurrencyService)
///   service_auth       — service name utf8     → bincode(ServiceAuth)
///   holder_types       — slug utf8             → bincode(HolderType)
///   holders            — holder_id utf8        → bincode(Holder)
///   currency_units     — symbol utf8           → bincode(CurrencyUnit)
///   accounts           — holder_id\0unit       → bincode(CheckingAccount)
///   transfer_rules     — name utf8             → bincode(TransferRule)
///   exchange_rules     — name utf8             → bincode(ExchangeRule)
///   adjustments        — uuid bytes            → bincode(AdjustmentTransaction)
///   transfers          — uuid bytes            → bincode(TransferTransaction)
///   exchanges          — uuid bytes            → bincode(ExchangeTransaction)
///   meta               — utf8 key              → raw bytes
pub struct Store {
    db: sled::Db,
    services: sled::Tree,
    service_auth: sled::Tree,
    holder_types: sled::Tree,
    holders: sled::Tree,
    currency_units: sled::Tree,
    accounts: sled::Tree,
    transfer_rules: sled::Tree,
    exchange_rules: sled::Tree,
    adjustments: sled::Tree,
    transfers: sled::Tree,
    exchanges: sled::Tree,
    meta: sled::Tree,
}

macro_rules! tree_accessor {
    ($name:ident) => {
        pub fn $name(&self) -> &sled::Tree {
            &self.$name
        }
    };
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let db = sled::open(path)?;
        Ok(Store {
            services: db.open_tree("services")?,
            service_auth: db.open_tree("service_auth")?,
            holder_types: db.open_tree("holder_types")?,
            holders: db.open_tree("holders")?,
            currency_units: db.open_tree("currency_units")?,
            accounts: db.open_tree("accounts")?,
            transfer_rules: db.open_tree("transfer_rules")?,
            exchange_rules: db.open_tree("exchange_rules")?,
            adjustments: db.open_tree("adjustments")?,
            transfers: db.open_tree("transfers")?,
            exchanges: db.open_tree("exchanges")?,
            meta: db.open_tree("meta")?,
            db,
        })
    }

    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    pub fn flush(&self) -> Result<(), LedgerError> {
        self.db.flush()?;
        Ok(())
    }

    tree_accessor!(services);
    tree_accessor!(service_auth);
    tree_accessor!(holder_types);
    tree_accessor!(holders);
    tree_accessor!(currency_units);
    tree_accessor!(accounts);
    tree_accessor!(transfer_rules);
    tree_accessor!(exchange_rules);
    tree_accessor!(adjustments);
    tree_accessor!(transfers);
    tree_accessor!(exchanges);
    tree_accessor!(meta);

    // ── Services ─────────────────────────────────────────────────────────

    pub fn get_service(&self, name: &str) -> Result<Option<CurrencyService>, LedgerError> {
        get_typed(&self.services, name.as_bytes())
    }

    pub fn put_service(&self, service: &CurrencyService) -> Result<(), LedgerError> {
        put_typed(&self.services, service.name.as_bytes(), service)
    }

    pub fn iter_services(&self) -> Result<Vec<CurrencyService>, LedgerError> {
        iter_typed(&self.services)
    }

    pub fn get_service_auth(&self, service_name: &str) -> Result<Option<ServiceAuth>, LedgerError> {
        get_typed(&self.service_auth, service_name.as_bytes())
    }

    pub fn put_service_auth(&self, auth: &ServiceAuth) -> Result<(), LedgerError> {
        put_typed(&self.service_auth, auth.service_name.as_bytes(), auth)
    }

    // ── Holder types ─────────────────────────────────────────────────────

    pub fn get_holder_type(&self, slug: &str) -> Result<Option<HolderType>, LedgerError> {
        get_typed(&self.holder_types, slug.as_bytes())
    }

    pub fn put_holder_type(&self, ht: &HolderType) -> Result<(), LedgerError> {
        put_typed(&self.holder_types, ht.slug.as_bytes(), ht)
    }

    // ── Holders ──────────────────────────────────────────────────────────

    pub fn get_holder(&self, holder_id: &str) -> Result<Option<Holder>, LedgerError> {
        get_typed(&self.holders, holder_id.as_bytes())
    }

    pub fn put_holder(&self, holder: &Holder) -> Result<(), LedgerError> {
        put_typed(&self.holders, holder.holder_id.as_bytes(), holder)
    }

    pub fn iter_holders(&self) -> Result<Vec<Holder>, LedgerError> {
        iter_typed(&self.holders)
    }

    // ── Currency units ───────────────────────────────────────────────────

    pub fn get_currency_unit(&self, symbol: &str) -> Result<Option<CurrencyUnit>, LedgerError> {
        get_typed(&self.currency_units, symbol.as_bytes())
    }

    pub fn put_currency_unit(&self, unit: &CurrencyUnit) -> Result<(), LedgerError> {
        put_typed(&self.currency_units, unit.symbol.as_bytes(), unit)
    }

    pub fn iter_currency_units(&self) -> Result<Vec<CurrencyUnit>, LedgerError> {
        iter_typed(&self.currency_units)
    }

    // ── Accounts ─────────────────────────────────────────────────────────

    pub fn get_account(
        &self,
        holder_id: &str,
        currency_unit: &str,
    ) -> Result<Option<CheckingAccount>, LedgerError> {
        get_typed(&self.accounts, &account_key(holder_id, currency_unit))
    }

    pub fn put_account(&self, account: &CheckingAccount) -> Result<(), LedgerError> {
        put_typed(
            &self.accounts,
            &account_key(&account.holder_id, &account.currency_unit),
            account,
        )
    }

    pub fn iter_accounts(&self) -> Result<Vec<CheckingAccount>, LedgerError> {
        iter_typed(&self.accounts)
    }

    // ── Rules ────────────────────────────────────────────────────────────

    pub fn get_transfer_rule(&self, name: &str) -> Result<Option<TransferRule>, LedgerError> {
        get_typed(&self.transfer_rules, name.as_bytes())
    }

    pub fn put_transfer_rule(&self, rule: &TransferRule) -> Result<(), LedgerError> {
        put_typed(&self.transfer_rules, rule.name.as_bytes(), rule)
    }

    pub fn get_exchange_rule(&self, name: &str) -> Result<Option<ExchangeRule>, LedgerError> {
        get_typed(&self.exchange_rules, name.as_bytes())
    }

    pub fn put_exchange_rule(&self, rule: &ExchangeRule) -> Result<(), LedgerError> {
        put_typed(&self.exchange_rules, rule.name.as_bytes(), rule)
    }

    // ── Transactions ─────────────────────────────────────────────────────

    pub fn get_adjustment(
        &self,
        uuid: &uuid::Uuid,
    ) -> Result<Option<AdjustmentTransaction>, LedgerError> {
        get_typed(&self.adjustments, uuid.as_bytes())
    }

    pub fn put_adjustment(&self, tx: &AdjustmentTransaction) -> Result<(), LedgerError> {
        put_typed(&self.adjustments, tx.header.uuid.as_bytes(), tx)
    }

    pub fn iter_adjustments(&self) -> Result<Vec<AdjustmentTransaction>, LedgerError> {
        iter_typed(&self.adjustments)
    }

    pub fn get_transfer(&self, uuid: &uuid::Uuid) -> Result<Option<TransferTransaction>, LedgerError> {
        get_typed(&self.transfers, uuid.as_bytes())
    }

    pub fn put_transfer(&self, tx: &TransferTransaction) -> Result<(), LedgerError> {
        put_typed(&self.transfers, tx.header.uuid.as_bytes(), tx)
    }

    pub fn iter_transfers(&self) -> Result<Vec<TransferTransaction>, LedgerError> {
        iter_typed(&self.transfers)
    }

    pub fn get_exchange(&self, uuid: &uuid::Uuid) -> Result<Option<ExchangeTransaction>, LedgerError> {
        get_typed(&self.exchanges, uuid.as_bytes())
    }

    pub fn put_exchange(&self, tx: &ExchangeTransaction) -> Result<(), LedgerError> {
        put_typed(&self.exchanges, tx.header.uuid.as_bytes(), tx)
    }

    pub fn iter_exchanges(&self) -> Result<Vec<ExchangeTransaction>, LedgerError> {
        iter_typed(&self.exchanges)
    }

    // ── Meta ─────────────────────────────────────────────────────────────

    pub fn get_meta(&self, key: &str) -> Result<Option<sled::IVec>, LedgerError> {
        Ok(self.meta.get(key.as_bytes())?)
    }

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        self.meta.insert(key.as_bytes(), value)?;
        Ok(())
    }
}

fn get_typed<T: serde::de::DeserializeOwned>(
    tree: &sled::Tree,
    key: &[u8],
) -> Result<Option<T>, LedgerError> {
    match tree.get(key)? {
        Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
        None => Ok(None),
    }
}

fn put_typed<T: serde::Serialize>(
    tree: &sled::Tree,
    key: &[u8],
    value: &T,
) -> Result<(), LedgerError> {
    let bytes = bincode::serialize(value)?;
    tree.insert(key, bytes)?;
    Ok(())
}

fn iter_typed<T: serde::de::DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>, LedgerError> {
    let mut out = Vec::new();
    for item in tree.iter() {
        let (_, bytes) = item?;
        out.push(bincode::deserialize(&bytes)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_tmp() -> Store {
        let dir = tempfile::tempdir().unwrap();
        Store::open(dir.path()).unwrap()
    }

    #[test]
    fn holder_roundtrip() {
        let store = open_tmp();
        let holder = Holder::new("player-1", "player");
        store.put_holder(&holder).unwrap();
        let fetched = store.get_holder("player-1").unwrap().unwrap();
        assert_eq!(fetched.holder_id, "player-1");
    }

    #[test]
    fn account_key_is_per_holder_and_unit() {
        let store = open_tmp();
        let mut account = CheckingAccount::new("player-1", "GLD");
        account.amount = ledger_core::Decimal::from_i64(100);
        store.put_account(&account).unwrap();

        assert!(store.get_account("player-1", "SLV").unwrap().is_none());
        let fetched = store.get_account("player-1", "GLD").unwrap().unwrap();
        assert_eq!(fetched.amount, account.amount);
    }

    #[test]
    fn missing_row_returns_none_not_error() {
        let store = open_tmp();
        assert!(store.get_service("nobody").unwrap().is_none());
    }
}
