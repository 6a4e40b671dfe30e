pub mod currency;
pub mod error;
pub mod holder;
pub mod service;
pub mod transaction;
pub mod types;

pub use currency::{CheckingAccount, CurrencyUnit, ExchangeDirection, ExchangeRule, TransferRule};
pub use error::{LedgerError, LedgerResult};
pub use holder::{Holder, HolderType};
pub use service::{CurrencyService, ServiceAuth};
pub use transaction::{
    AdjustmentTransaction, ExchangeTransaction, TransactionHeader, TransactionStatus,
    TransferTransaction,
};
pub use types::{new_tx_uuid, Decimal, HolderId, Timestamp, TxUuid};
