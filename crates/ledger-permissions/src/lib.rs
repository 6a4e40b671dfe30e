//! Interprets a per-service permission document against each engine
//! operation (spec.md §4.7).
//!
//! The document is dynamically typed JSON; rather than model every key as a
//! strongly-typed struct (which would make unknown keys an error, contrary
//! to spec), this reads the recognised paths directly off the
//! [`serde_json::Value`] and fails closed on anything missing or
//! malformed.

use ledger_core::{Decimal, LedgerError};
use serde_json::Value;
use std::str::FromStr;

/// The six sections a permission document may govern.
pub const SECTIONS: &[&str] = &["adjustments", "transfers", "exchanges", "holders", "accounts", "units"];

fn verbose_name(section: &str) -> String {
    let mut chars = section.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn missing(verbose: &str, path: &str) -> LedgerError {
    LedgerError::permission(format!("{verbose}: Missing required permission '{path}'"))
}

/// A parsed view over a service's permission document.
pub struct PermissionDoc<'a> {
    value: &'a Value,
}

impl<'a> PermissionDoc<'a> {
    pub fn new(value: &'a Value) -> Self {
        PermissionDoc { value }
    }

    fn is_root(&self) -> bool {
        self.value.get("root").and_then(Value::as_bool).unwrap_or(false)
    }

    fn section(&self, section: &str) -> Option<&'a Value> {
        self.value.get(section)
    }

    fn sub(section_value: Option<&'a Value>, key: &str) -> Option<&'a Value> {
        section_value.and_then(|s| s.get(key))
    }

    /// `<section>.enabled: true`, else fails (spec.md §4.7 table row 2).
    pub fn enforce_access(&self, section: &str) -> Result<(), LedgerError> {
        if self.is_root() {
            return Ok(());
        }
        let verbose = verbose_name(section);
        let Some(sec) = self.section(section) else {
            return Err(missing(&verbose, &format!("{section}.enabled")));
        };
        match sec.get("enabled").and_then(Value::as_bool) {
            Some(true) => Ok(()),
            Some(false) => Err(LedgerError::permission(format!("{verbose} Access is disabled"))),
            None => Err(missing(&verbose, &format!("{section}.enabled"))),
        }
    }

    /// `<section>.create.enabled: true`.
    pub fn enforce_create(&self, section: &str) -> Result<(), LedgerError> {
        if self.is_root() {
            return Ok(());
        }
        self.enforce_access(section)?;
        let verbose = verbose_name(section);
        let create = Self::sub(self.section(section), "create");
        match create.and_then(|c| c.get("enabled")).and_then(Value::as_bool) {
            Some(true) => Ok(()),
            Some(false) => Err(LedgerError::permission(format!("{verbose} Create is disabled"))),
            None => Err(missing(&verbose, &format!("{section}.create.enabled"))),
        }
    }

    /// `<section>.create.min_amount` / `max_amount`: strict `min < amount <
    /// max` (spec.md §9, "Ambiguity" — strict, not inclusive, matching the
    /// source).
    pub fn enforce_amount(&self, section: &str, amount: Decimal) -> Result<(), LedgerError> {
        if self.is_root() {
            return Ok(());
        }
        let verbose = verbose_name(section);
        let create = Self::sub(self.section(section), "create");
        let min = parse_decimal_field(create.and_then(|c| c.get("min_amount")), &verbose)?;
        let max = parse_decimal_field(create.and_then(|c| c.get("max_amount")), &verbose)?;

        if let Some(min) = min {
            if amount.inner() <= min.inner() {
                return Err(LedgerError::permission(format!(
                    "{verbose}: amount must be greater than {min}"
                )));
            }
        }
        if let Some(max) = max {
            if amount.inner() >= max.inner() {
                return Err(LedgerError::permission(format!(
                    "{verbose}: amount must be less than {max}"
                )));
            }
        }
        Ok(())
    }

    /// `<section>.create.min_auto_reject` / `max_auto_reject`, expressed in
    /// seconds, checked the same way as `enforce_amount`.
    pub fn enforce_auto_reject_timeout(&self, section: &str, timeout_seconds: i64) -> Result<(), LedgerError> {
        if self.is_root() {
            return Ok(());
        }
        let verbose = verbose_name(section);
        let create = Self::sub(self.section(section), "create");
        let min = parse_i64_field(create.and_then(|c| c.get("min_auto_reject")), &verbose)?;
        let max = parse_i64_field(create.and_then(|c| c.get("max_auto_reject")), &verbose)?;

        if let Some(min) = min {
            if timeout_seconds <= min {
                return Err(LedgerError::permission(format!(
                    "{verbose}: auto_reject_timeout must be greater than {min}"
                )));
            }
        }
        if let Some(max) = max {
            if timeout_seconds >= max {
                return Err(LedgerError::permission(format!(
                    "{verbose}: auto_reject_timeout must be less than {max}"
                )));
            }
        }
        Ok(())
    }

    /// `<section>.confirm.enabled: true` **and** `service_name` listed in
    /// `confirm.services`.
    pub fn enforce_confirm(&self, section: &str, service_name: &str) -> Result<(), LedgerError> {
        self.enforce_action(section, "confirm", service_name)
    }

    /// `<section>.reject.enabled: true` **and** `service_name` listed in
    /// `reject.services`.
    pub fn enforce_reject(&self, section: &str, service_name: &str) -> Result<(), LedgerError> {
        self.enforce_action(section, "reject", service_name)
    }

    fn enforce_action(&self, section: &str, action: &str, service_name: &str) -> Result<(), LedgerError> {
        if self.is_root() {
            return Ok(());
        }
        let verbose = verbose_name(section);
        let node = Self::sub(self.section(section), action);
        match node.and_then(|n| n.get("enabled")).and_then(Value::as_bool) {
            Some(true) => {}
            Some(false) => {
                return Err(LedgerError::permission(format!("{verbose} {action} is disabled")))
            }
            None => return Err(missing(&verbose, &format!("{section}.{action}.enabled"))),
        }

        let services = node
            .and_then(|n| n.get("services"))
            .and_then(Value::as_array)
            .ok_or_else(|| missing(&verbose, &format!("{section}.{action}.services")))?;
        let allowed = services
            .iter()
            .any(|v| v.as_str() == Some(service_name));
        if !allowed {
            return Err(LedgerError::permission(format!(
                "{verbose}: service '{service_name}' is not permitted to {action}"
            )));
        }
        Ok(())
    }

    /// `<section>.update.enabled: true`.
    pub fn enforce_update(&self, section: &str) -> Result<(), LedgerError> {
        if self.is_root() {
            return Ok(());
        }
        let verbose = verbose_name(section);
        let update = Self::sub(self.section(section), "update");
        match update.and_then(|u| u.get("enabled")).and_then(Value::as_bool) {
            Some(true) => Ok(()),
            Some(false) => Err(LedgerError::permission(format!("{verbose} Update is disabled"))),
            None => Err(missing(&verbose, &format!("{section}.update.enabled"))),
        }
    }
}

fn parse_decimal_field(value: Option<&Value>, verbose: &str) -> Result<Option<Decimal>, LedgerError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let parsed = match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => n
            .as_f64()
            .and_then(|f| rust_decimal::Decimal::try_from(f).ok())
            .and_then(|d| Decimal::new(d).ok()),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| LedgerError::permission(format!("{verbose}: Error in min_amount or in max_amount permission")))
}

fn parse_i64_field(value: Option<&Value>, verbose: &str) -> Result<Option<i64>, LedgerError> {
    let Some(value) = value else {
        return Ok(None);
    };
    value
        .as_i64()
        .map(Some)
        .ok_or_else(|| LedgerError::permission(format!("{verbose}: Error in min_auto_reject or in max_auto_reject permission")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_bypasses_every_check() {
        let doc = json!({ "root": true });
        let perm = PermissionDoc::new(&doc);
        assert!(perm.enforce_access("adjustments").is_ok());
        assert!(perm.enforce_create("adjustments").is_ok());
        assert!(perm.enforce_amount("adjustments", Decimal::from_i64(1_000_000)).is_ok());
        assert!(perm.enforce_confirm("adjustments", "anyone").is_ok());
    }

    #[test]
    fn empty_document_fails_closed() {
        let doc = json!({});
        let perm = PermissionDoc::new(&doc);
        let err = perm.enforce_access("adjustments").unwrap_err();
        assert!(matches!(err, LedgerError::Permission(msg) if msg.contains("Missing required permission")));
    }

    #[test]
    fn disabled_section_is_distinct_from_missing() {
        let doc = json!({ "adjustments": { "enabled": false } });
        let perm = PermissionDoc::new(&doc);
        let err = perm.enforce_access("adjustments").unwrap_err();
        assert!(matches!(err, LedgerError::Permission(msg) if msg.contains("Access is disabled")));
    }

    #[test]
    fn amount_bounds_are_strict() {
        let doc = json!({
            "adjustments": { "enabled": true, "create": { "enabled": true, "min_amount": "0", "max_amount": "100" } }
        });
        let perm = PermissionDoc::new(&doc);
        assert!(perm.enforce_amount("adjustments", Decimal::from_i64(0)).is_err());
        assert!(perm.enforce_amount("adjustments", Decimal::from_i64(100)).is_err());
        assert!(perm.enforce_amount("adjustments", Decimal::from_i64(50)).is_ok());
    }

    #[test]
    fn non_numeric_bound_is_a_permission_error_not_a_panic() {
        let doc = json!({
            "adjustments": { "enabled": true, "create": { "enabled": true, "min_amount": "not-a-number" } }
        });
        let perm = PermissionDoc::new(&doc);
        let err = perm.enforce_amount("adjustments", Decimal::from_i64(10)).unwrap_err();
        assert!(matches!(err, LedgerError::Permission(msg) if msg.contains("Error in min_amount")));
    }

    #[test]
    fn confirm_requires_both_enabled_and_service_listed() {
        let doc = json!({
            "transfers": { "confirm": { "enabled": true, "services": ["billing"] } }
        });
        let perm = PermissionDoc::new(&doc);
        assert!(perm.enforce_confirm("transfers", "billing").is_ok());
        assert!(perm.enforce_confirm("transfers", "other").is_err());
    }
}
