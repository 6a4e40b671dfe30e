//! Validates a signed request against a service's HMAC secret
//! (spec.md §4.8). Shared by both schemes; `extract_battlemetrics_parts`
//! is the only scheme-specific parsing step.

use chrono::{DateTime, Duration, Utc};
use ledger_core::LedgerError;
use regex::Regex;
use subtle::ConstantTimeEq;

use crate::generators::{battlemetrics_base_string, sign, timestamp_base_string};

const MISMATCH_MESSAGE: &str = "Request body, signature or secret key is corrupted, hmac does not match";

fn parse_rfc3339_with_tz(raw: &str) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| LedgerError::validation("Timestamp must be RFC3339 with a timezone offset"))
}

fn check_deviation(timestamp: DateTime<Utc>, deviation: Duration) -> Result<(), LedgerError> {
    let now = Utc::now();
    if timestamp < now - deviation || timestamp > now + deviation {
        return Err(LedgerError::validation("Timestamp is very old or very far in the future"));
    }
    Ok(())
}

fn constant_time_eq(expected_hex: &str, actual_hex: &str) -> bool {
    let expected = expected_hex.as_bytes();
    let actual = actual_hex.as_bytes();
    expected.len() == actual.len() && expected.ct_eq(actual).into()
}

/// Validate the plain timestamp scheme: signature over
/// `"{timestamp}.{path}.{body}"`.
pub fn validate_timestamp_request(
    secret: &str,
    timestamp_raw: &str,
    signature: &str,
    path: &str,
    body: &[u8],
    deviation: Duration,
) -> Result<(), LedgerError> {
    let timestamp = parse_rfc3339_with_tz(timestamp_raw)?;
    check_deviation(timestamp, deviation)?;

    let expected = sign(secret, &timestamp_base_string(timestamp_raw, path, body));
    if !constant_time_eq(&expected, signature) {
        return Err(LedgerError::validation(MISMATCH_MESSAGE));
    }
    Ok(())
}

/// Extracted `t=`/`s=` fields from a single Battlemetrics-style header.
pub struct BattlemetricsParts {
    pub timestamp: String,
    pub signature: String,
}

/// Extract `t=<iso>,s=<hex>` from a single header value using the
/// configured regexes (spec.md §6.2).
pub fn extract_battlemetrics_parts(
    header_value: &str,
    signature_regex: &str,
    timestamp_regex: &str,
) -> Result<BattlemetricsParts, LedgerError> {
    let sig_re = Regex::new(signature_regex)
        .map_err(|e| LedgerError::validation(format!("invalid signature regex: {e}")))?;
    let ts_re = Regex::new(timestamp_regex)
        .map_err(|e| LedgerError::validation(format!("invalid timestamp regex: {e}")))?;

    let signature = sig_re
        .captures(header_value)
        .and_then(|c| c.get(1))
        .ok_or_else(|| LedgerError::validation("signature header did not match the expected pattern"))?
        .as_str()
        .to_string();
    let timestamp = ts_re
        .captures(header_value)
        .and_then(|c| c.get(1))
        .ok_or_else(|| LedgerError::validation("signature header did not match the expected pattern"))?
        .as_str()
        .to_string();

    Ok(BattlemetricsParts { timestamp, signature })
}

/// Validate the Battlemetrics scheme: signature over `"{timestamp}.{body}"`.
pub fn validate_battlemetrics_request(
    secret: &str,
    header_value: &str,
    body: &[u8],
    deviation: Duration,
    signature_regex: &str,
    timestamp_regex: &str,
) -> Result<(), LedgerError> {
    let parts = extract_battlemetrics_parts(header_value, signature_regex, timestamp_regex)?;
    let timestamp = parse_rfc3339_with_tz(&parts.timestamp)?;
    check_deviation(timestamp, deviation)?;

    let expected = sign(secret, &battlemetrics_base_string(&parts.timestamp, body));
    if !constant_time_eq(&expected, &parts.signature) {
        return Err(LedgerError::validation(MISMATCH_MESSAGE));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_round_trip_validates() {
        let now = Utc::now().to_rfc3339();
        let secret = "top-secret";
        let sig = sign(secret, &timestamp_base_string(&now, "/adjustments/create/", b"{}"));
        assert!(validate_timestamp_request(secret, &now, &sig, "/adjustments/create/", b"{}", Duration::seconds(30)).is_ok());
    }

    #[test]
    fn flipping_a_body_byte_fails_validation() {
        let now = Utc::now().to_rfc3339();
        let secret = "top-secret";
        let sig = sign(secret, &timestamp_base_string(&now, "/adjustments/create/", b"{}"));
        let result = validate_timestamp_request(secret, &now, &sig, "/adjustments/create/", b"{\"x\":1}", Duration::seconds(30));
        assert!(result.is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let old = (Utc::now() - Duration::hours(1)).to_rfc3339();
        let secret = "top-secret";
        let sig = sign(secret, &timestamp_base_string(&old, "/p/", b"{}"));
        let result = validate_timestamp_request(secret, &old, &sig, "/p/", b"{}", Duration::seconds(30));
        assert!(result.is_err());
    }

    #[test]
    fn battlemetrics_header_round_trips() {
        let now = Utc::now().to_rfc3339();
        let secret = "bm-secret";
        let sig = sign(secret, &battlemetrics_base_string(&now, b"{}"));
        let header = format!("t={now},s={sig}");
        let result = validate_battlemetrics_request(
            secret,
            &header,
            b"{}",
            Duration::seconds(30),
            r"s=([A-Za-z0-9_]+)",
            r"t=([\w\-:.+]+)",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn battlemetrics_corrupted_body_fails() {
        let now = Utc::now().to_rfc3339();
        let secret = "bm-secret";
        let sig = sign(secret, &battlemetrics_base_string(&now, b"{}"));
        let header = format!("t={now},s={sig}");
        let result = validate_battlemetrics_request(
            secret,
            &header,
            b"{\"tampered\":true}",
            Duration::seconds(30),
            r"s=([A-Za-z0-9_]+)",
            r"t=([\w\-:.+]+)",
        );
        assert!(result.is_err());
    }
}
