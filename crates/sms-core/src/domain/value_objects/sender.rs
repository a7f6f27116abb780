//! Sender Value Object
//!
//! Alphanumeric SMS sender ID ("From" label shown by carriers).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SenderRules;
use crate::error::{SmsError, SmsResult};

/// Severity attached to a sender verdict
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// No value given; the caller decides whether one is required
    Empty,
    Ok,
    Warning,
    Error,
}

/// Outcome of checking a candidate sender name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderVerdict {
    pub valid: bool,
    pub severity: Severity,
    pub message: String,
}

impl SenderVerdict {
    fn new(valid: bool, severity: Severity, message: impl Into<String>) -> Self {
        Self { valid, severity, message: message.into() }
    }
}

/// Check a sender name. Rules apply in order and the first hard failure wins.
pub fn validate_sender(name: &str, rules: SenderRules) -> SenderVerdict {
    if name.is_empty() {
        return SenderVerdict::new(false, Severity::Empty, "no sender given");
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return SenderVerdict::new(false, Severity::Error, "must be alphanumeric");
    }

    // ASCII only past this point, so byte length is character length
    if name.len() > rules.max_len {
        return SenderVerdict::new(
            false,
            Severity::Error,
            format!("exceeds {} characters", rules.max_len),
        );
    }

    if name.len() < rules.min_len {
        return SenderVerdict::new(
            true,
            Severity::Warning,
            format!("shorter than recommended minimum of {} characters", rules.min_len),
        );
    }

    SenderVerdict::new(true, Severity::Ok, "valid sender")
}

/// Sender name that passed validation (possibly with a warning)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderName(String);

impl SenderName {
    pub fn parse(name: impl Into<String>, rules: SenderRules) -> SmsResult<Self> {
        let name = name.into();
        let verdict = validate_sender(&name, rules);
        if !verdict.valid {
            return Err(SmsError::InvalidSender { name, reason: verdict.message });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SenderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &str) -> SenderVerdict {
        validate_sender(name, SenderRules::default())
    }

    #[test]
    fn test_valid_sender() {
        let v = check("ERP");
        assert!(v.valid);
        assert_eq!(v.severity, Severity::Ok);
    }

    #[test]
    fn test_hyphen_rejected() {
        let v = check("ERPNEXT-1");
        assert!(!v.valid);
        assert_eq!(v.severity, Severity::Error);
        assert_eq!(v.message, "must be alphanumeric");
    }

    #[test]
    fn test_short_sender_warns() {
        let v = check("A");
        assert!(v.valid);
        assert_eq!(v.severity, Severity::Warning);
    }

    #[test]
    fn test_too_long_rejected() {
        let v = check("TOOLONGSENDER1");
        assert!(!v.valid);
        assert_eq!(v.message, "exceeds 11 characters");
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(check("ABCDEFGHIJK").severity, Severity::Ok);
        assert_eq!(check("ABC").severity, Severity::Ok);
        assert_eq!(check("AB").severity, Severity::Warning);
    }

    #[test]
    fn test_non_ascii_rejected() {
        assert_eq!(check("Café").severity, Severity::Error);
    }

    #[test]
    fn test_alphanumeric_checked_before_length() {
        assert_eq!(check("WAY-TOO-LONG-SENDER").message, "must be alphanumeric");
    }

    #[test]
    fn test_empty_is_not_an_error() {
        let v = check("");
        assert!(!v.valid);
        assert_eq!(v.severity, Severity::Empty);
    }

    #[test]
    fn test_custom_minimum() {
        let rules = SenderRules { min_len: 1, max_len: 11 };
        assert_eq!(validate_sender("A", rules).severity, Severity::Ok);
    }

    #[test]
    fn test_parse() {
        assert_eq!(SenderName::parse("Shop", SenderRules::default()).unwrap().as_str(), "Shop");
        assert!(matches!(
            SenderName::parse("bad sender", SenderRules::default()),
            Err(SmsError::InvalidSender { .. })
        ));
    }
}
