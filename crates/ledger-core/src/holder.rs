//! Holders and their type classification (spec.md §3).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{HolderId, Timestamp};

/// A named class of holder (e.g. `player`). `CURRENCY_DEFAULT_HOLDER_TYPE_SLUG`
/// (spec.md §6.4) names the slug that is auto-created on first use.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HolderType {
    pub slug: String,
}

impl HolderType {
    pub fn new(slug: impl Into<String>) -> Self {
        HolderType { slug: slug.into() }
    }
}

/// An external actor owning [`crate::currency::CheckingAccount`]s. Never
/// deleted once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Holder {
    pub holder_id: HolderId,
    pub holder_type: String,
    pub enabled: bool,
    pub info: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Holder {
    pub fn new(holder_id: impl Into<String>, holder_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Holder {
            holder_id: holder_id.into(),
            holder_type: holder_type.into(),
            enabled: true,
            info: Value::Object(serde_json::Map::new()),
            created_at: now,
            updated_at: now,
        }
    }
}
