//! The three independent periodic outdated-rejection sweeps (spec.md §4.5).
//! The host process picks the trigger (cron, ticker, external scheduler);
//! these are plain functions with no scheduling opinion of their own.

use ledger_core::LedgerError;
use ledger_store::Store;
use uuid::Uuid;

use crate::{adjustments, exchanges, transfers};

const SWEEP_STATUS_DESCRIPTION: &str = "Rejected by cron as outdated";

pub struct SweepReport {
    pub rejected_adjustments: Vec<Uuid>,
    pub rejected_transfers: Vec<Uuid>,
    pub rejected_exchanges: Vec<Uuid>,
}

pub fn reject_outdated_adjustments(store: &Store) -> Result<Vec<Uuid>, LedgerError> {
    adjustments::reject_all_outdated(store, SWEEP_STATUS_DESCRIPTION)
}

pub fn reject_outdated_transfers(store: &Store) -> Result<Vec<Uuid>, LedgerError> {
    transfers::reject_all_outdated(store, SWEEP_STATUS_DESCRIPTION)
}

pub fn reject_outdated_exchanges(store: &Store) -> Result<Vec<Uuid>, LedgerError> {
    exchanges::reject_all_outdated(store, SWEEP_STATUS_DESCRIPTION)
}

/// Run all three sweeps. No ordering is required between them; collapse
/// should run after this, but is harmless either way since confirm/reject
/// gate on a PENDING-only check (spec.md §9).
pub fn sweep_all(store: &Store) -> Result<SweepReport, LedgerError> {
    Ok(SweepReport {
        rejected_adjustments: reject_outdated_adjustments(store)?,
        rejected_transfers: reject_outdated_transfers(store)?,
        rejected_exchanges: reject_outdated_exchanges(store)?,
    })
}
