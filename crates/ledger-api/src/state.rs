use std::sync::Arc;

use ledger_auth::HmacConfig;
use ledger_store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub hmac_config: Arc<HmacConfig>,
    pub default_auto_reject: chrono::Duration,
}

impl AppState {
    pub fn new(store: Arc<Store>, hmac_config: Arc<HmacConfig>) -> Self {
        AppState {
            store,
            hmac_config,
            default_auto_reject: chrono::Duration::minutes(15),
        }
    }

    pub fn with_default_auto_reject(mut self, timeout: chrono::Duration) -> Self {
        self.default_auto_reject = timeout;
        self
    }
}
