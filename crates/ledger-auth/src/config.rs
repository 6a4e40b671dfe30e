//! Process-global HMAC configuration (spec.md §6.4).

use chrono::Duration;

#[derive(Clone, Debug)]
pub struct HmacConfig {
    pub enable_hmac_validation: bool,
    pub timestamp_deviation: Duration,
    pub service_header: String,
    pub signature_header: String,
    pub timestamp_header: String,
    pub battlemetrics_signature_regex: String,
    pub battlemetrics_timestamp_regex: String,
}

impl Default for HmacConfig {
    fn default() -> Self {
        HmacConfig {
            enable_hmac_validation: true,
            timestamp_deviation: Duration::seconds(30),
            service_header: "X-SERVICE".to_string(),
            signature_header: "X-SIGNATURE".to_string(),
            timestamp_header: "X-SIGNATURE-TIMESTAMP".to_string(),
            battlemetrics_signature_regex: r"s=([A-Za-z0-9_]+)".to_string(),
            battlemetrics_timestamp_regex: r"t=([\w\-:.+]+)".to_string(),
        }
    }
}
