//! The engine-wide error sum type (spec.md §7, §9).
//!
//! The source attaches a distinct `ValidationError` class to each Django
//! service class; here every engine shares one error enum tagged with a
//! `kind()` the API layer maps straight to an HTTP status.

use std::collections::BTreeMap;

use thiserror::Error;

/// Per-field validation detail, surfaced at the API layer as `extra.fields`.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum LedgerError {
    // ── Validation ───────────────────────────────────────────────────────
    /// A business rule was violated: bad amount, insufficient funds, wrong
    /// currency, already-terminal transaction, precision exceeded, disabled
    /// rule. Surfaces as 400.
    #[error("{message}")]
    Validation {
        message: String,
        fields: FieldErrors,
    },

    // ── Permission / auth ────────────────────────────────────────────────
    /// The calling service's permission document rejected the operation.
    /// Surfaces as 403 with `message` passed through verbatim.
    #[error("{0}")]
    Permission(String),

    /// HMAC or service-resolution failure. Surfaces as 401.
    #[error("{0}")]
    Auth(String),

    // ── Lookup ───────────────────────────────────────────────────────────
    /// Holder/account/rule/transaction not found. Surfaces as 404.
    #[error("{0}")]
    NotFound(String),

    // ── Storage ──────────────────────────────────────────────────────────
    /// The store reported a serialization conflict that survived every
    /// retry.
    #[error("serialization conflict: {0}")]
    Conflict(String),

    /// Persistence-layer failure unrelated to serialization conflicts
    /// (I/O error, corrupt record, codec failure).
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation {
            message: message.into(),
            fields: FieldErrors::new(),
        }
    }

    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = FieldErrors::new();
        fields.insert(field.into(), message.clone());
        LedgerError::Validation { message, fields }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        LedgerError::NotFound(message.into())
    }

    pub fn permission(message: impl Into<String>) -> Self {
        LedgerError::Permission(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        LedgerError::Auth(message.into())
    }

    /// Tag used by the API layer to pick a status code without matching on
    /// every variant at every call site.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Validation { .. } => "Validation",
            LedgerError::Permission(_) => "Permission",
            LedgerError::Auth(_) => "Auth",
            LedgerError::NotFound(_) => "NotFound",
            LedgerError::Conflict(_) => "Conflict",
            LedgerError::Storage(_) => "Storage",
        }
    }
}

impl From<sled::Error> for LedgerError {
    fn from(err: sled::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
