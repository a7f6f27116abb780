//! Core configuration
//!
//! Every constant the pricing and validation rules depend on lives here so the
//! caller can override it from a config file.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{SmsError, SmsResult};

/// Template used when a campaign has none of its own
pub const DEFAULT_CAMPAIGN_TEMPLATE: &str =
    "Bonjour {{customer_name}}, nous vous proposons {{item_name}} au prix de {{final_price}}€.";

/// Configuration consumed by the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    /// Country code applied to national numbers
    pub default_country_code: String,
    /// Estimated cost of one message, billed once per distinct customer
    pub per_message_cost: Decimal,
    /// Characters per billed SMS segment
    pub segment_threshold: usize,
    /// Sender name rules
    pub sender: SenderRules,
    /// Digit bounds for the strict pre-dispatch phone check
    pub strict_phone_digits: DigitBounds,
    /// Number of lines rendered by a campaign preview
    pub preview_limit: usize,
    /// Sender names tried in order when no sender exists yet
    pub fallback_senders: Vec<String>,
    /// Campaign template used when a campaign has none
    pub default_template: String,
    /// Campaign currency
    pub currency: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            default_country_code: "+33".into(),
            per_message_cost: dec!(0.10),
            segment_threshold: 160,
            sender: SenderRules::default(),
            strict_phone_digits: DigitBounds::default(),
            preview_limit: 3,
            fallback_senders: vec!["ERPNext".into(), "ERP".into(), "System".into(), "SMS".into()],
            default_template: DEFAULT_CAMPAIGN_TEMPLATE.into(),
            currency: "EUR".into(),
        }
    }
}

impl SmsConfig {
    /// Check internal consistency
    pub fn validate(&self) -> SmsResult<()> {
        if !self.default_country_code.starts_with('+')
            || self.default_country_code.len() < 2
            || !self.default_country_code[1..].chars().all(|c| c.is_ascii_digit())
        {
            return Err(SmsError::Config(format!(
                "country code must look like +33, got '{}'",
                self.default_country_code
            )));
        }
        if self.per_message_cost < Decimal::ZERO {
            return Err(SmsError::Config("per-message cost cannot be negative".into()));
        }
        if self.segment_threshold == 0 {
            return Err(SmsError::Config("segment threshold must be positive".into()));
        }
        if self.sender.min_len > self.sender.max_len {
            return Err(SmsError::Config(format!(
                "sender min length {} exceeds max length {}",
                self.sender.min_len, self.sender.max_len
            )));
        }
        if self.strict_phone_digits.min > self.strict_phone_digits.max {
            return Err(SmsError::Config("phone digit bounds are inverted".into()));
        }
        Ok(())
    }
}

/// Sender ID length rules. The maximum is the GSM alphanumeric limit, the
/// minimum is a house convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderRules {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for SenderRules {
    fn default() -> Self {
        Self { min_len: 3, max_len: 11 }
    }
}

/// Inclusive digit-count bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitBounds {
    pub min: usize,
    pub max: usize,
}

impl Default for DigitBounds {
    fn default() -> Self {
        Self { min: 10, max: 15 }
    }
}
