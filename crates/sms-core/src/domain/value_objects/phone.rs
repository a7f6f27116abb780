//! Phone Value Object
//!
//! Best-effort normalization of user-typed numbers into an international
//! `+<digits>` form, plus a strict check used right before dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::DigitBounds;
use crate::error::{SmsError, SmsResult};

/// Country code used when the caller does not configure one
pub const DEFAULT_COUNTRY_CODE: &str = "+33";

/// Normalize an arbitrary phone string.
///
/// Every character other than ASCII digits and `+` is dropped. A leading `0`
/// is replaced by `country_code`, a number without a leading `+` gets
/// `country_code` prepended. No length checks are made.
pub fn normalize(raw: &str, country_code: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if let Some(rest) = cleaned.strip_prefix('0') {
        format!("{}{}", country_code, rest)
    } else if cleaned.starts_with('+') {
        cleaned
    } else {
        format!("{}{}", country_code, cleaned)
    }
}

/// Normalized phone number
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalize with the given country code
    pub fn normalize_with(raw: &str, country_code: &str) -> Self {
        Self(normalize(raw, country_code))
    }

    /// Normalize a form field. Blank input stays absent.
    pub fn normalize_optional(raw: Option<&str>, country_code: &str) -> Option<Self> {
        match raw {
            Some(value) if !value.trim().is_empty() => Some(Self::normalize_with(value, country_code)),
            _ => None,
        }
    }

    /// Normalize, then require `+` followed only by digits within `bounds`
    pub fn parse_strict(raw: &str, country_code: &str, bounds: DigitBounds) -> SmsResult<Self> {
        if raw.trim().is_empty() {
            return Err(SmsError::InvalidPhone("empty phone number".into()));
        }

        let phone = Self::normalize_with(raw, country_code);
        let Some(digits) = phone.0.strip_prefix('+') else {
            return Err(SmsError::InvalidPhone(phone.0));
        };

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(SmsError::InvalidPhone(phone.0));
        }
        if digits.len() < bounds.min || digits.len() > bounds.max {
            return Err(SmsError::InvalidPhone(phone.0));
        }

        Ok(phone)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
