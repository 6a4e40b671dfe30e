//! Calling services and their authentication material (spec.md §3).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Timestamp;

/// A registered caller. Owns zero or one [`ServiceAuth`] and a free-form
/// `permissions` document interpreted by `ledger-permissions`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurrencyService {
    pub name: String,
    pub enabled: bool,
    pub permissions: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CurrencyService {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        CurrencyService {
            name: name.into(),
            enabled: true,
            permissions: Value::Object(serde_json::Map::new()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Authentication material bound to a service: a shared HMAC secret plus
/// which signature scheme (plain timestamp vs. Battlemetrics) to validate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceAuth {
    pub service_name: String,
    pub key: String,
    pub is_battlemetrics: bool,
}
