pub mod accounts;
pub mod adjustments;
pub mod exchanges;
pub mod holders;
pub mod transfers;
pub mod units;
