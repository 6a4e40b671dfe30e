pub mod config;
pub mod generators;
pub mod validator;

pub use config::HmacConfig;
pub use validator::{validate_battlemetrics_request, validate_timestamp_request};

/// Dispatches to the configured scheme for a resolved service
/// (spec.md §4.8). The caller (the API layer, which owns the service
/// lookup) supplies `is_battlemetrics` from the service's `ServiceAuth`.
pub fn validate_request(
    config: &HmacConfig,
    secret: &str,
    is_battlemetrics: bool,
    path: &str,
    body: &[u8],
    timestamp_header_value: Option<&str>,
    signature_header_value: Option<&str>,
) -> Result<(), ledger_core::LedgerError> {
    if is_battlemetrics {
        let header = signature_header_value
            .ok_or_else(|| ledger_core::LedgerError::validation("missing signature header"))?;
        validate_battlemetrics_request(
            secret,
            header,
            body,
            config.timestamp_deviation,
            &config.battlemetrics_signature_regex,
            &config.battlemetrics_timestamp_regex,
        )
    } else {
        let timestamp = timestamp_header_value
            .ok_or_else(|| ledger_core::LedgerError::validation("missing timestamp header"))?;
        let signature = signature_header_value
            .ok_or_else(|| ledger_core::LedgerError::validation("missing signature header"))?;
        validate_timestamp_request(secret, timestamp, signature, path, body, config.timestamp_deviation)
    }
}
