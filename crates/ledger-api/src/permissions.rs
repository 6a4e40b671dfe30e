//! Thin owned wrapper around [`PermissionDoc`] so a handler can resolve a
//! service's permission document once and chain several `enforce_*` calls
//! against it without juggling the borrow of a short-lived `get_service`
//! result.

use ledger_core::{Decimal, LedgerError};
use ledger_permissions::PermissionDoc;
use serde_json::Value;

use crate::auth::AuthContext;
use crate::state::AppState;

pub struct ServicePermissions(Value);

impl ServicePermissions {
    pub fn resolve(state: &AppState, auth: &AuthContext) -> Result<Self, LedgerError> {
        let service = state.store.get_service(&auth.service_name)?;
        Ok(ServicePermissions(service.map(|s| s.permissions).unwrap_or_default()))
    }

    fn doc(&self) -> PermissionDoc<'_> {
        PermissionDoc::new(&self.0)
    }

    pub fn enforce_access(&self, section: &str) -> Result<(), LedgerError> {
        self.doc().enforce_access(section)
    }

    pub fn enforce_create(&self, section: &str) -> Result<(), LedgerError> {
        self.doc().enforce_create(section)
    }

    pub fn enforce_amount(&self, section: &str, amount: Decimal) -> Result<(), LedgerError> {
        self.doc().enforce_amount(section, amount)
    }

    pub fn enforce_auto_reject_timeout(&self, section: &str, timeout_seconds: i64) -> Result<(), LedgerError> {
        self.doc().enforce_auto_reject_timeout(section, timeout_seconds)
    }

    pub fn enforce_confirm(&self, section: &str, service_name: &str) -> Result<(), LedgerError> {
        self.doc().enforce_confirm(section, service_name)
    }

    pub fn enforce_reject(&self, section: &str, service_name: &str) -> Result<(), LedgerError> {
        self.doc().enforce_reject(section, service_name)
    }

    pub fn enforce_update(&self, section: &str) -> Result<(), LedgerError> {
        self.doc().enforce_update(section)
    }
}
