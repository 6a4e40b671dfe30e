pub mod db;
pub mod keys;
pub mod tx;

pub use db::Store;
pub use tx::{
    retry_on_serialization_conflict, with_serializable_tx1, with_serializable_tx2,
    with_serializable_tx3, TxResult,
};
