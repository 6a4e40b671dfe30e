pub mod accounts;
pub mod adjustments;
pub mod collapse;
pub mod exchanges;
pub mod sweeper;
pub mod transfers;
mod ttree;

pub use collapse::collapse_old_transactions;
pub use sweeper::{reject_outdated_adjustments, reject_outdated_exchanges, reject_outdated_transfers, sweep_all, SweepReport};
