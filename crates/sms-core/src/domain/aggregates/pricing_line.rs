//! Pricing line
//!
//! One customer/item row of a campaign. Input fields are edited by the caller;
//! `unit_price_with_margin` and `line_amount` are only written by [`PricingLine::reprice`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::services::pricer::{price_line, LinePrice};
use crate::domain::value_objects::{MarginMode, PhoneNumber};
use crate::error::{SmsError, SmsResult};

/// Margin applied to rows added from the form
pub const NEW_ROW_MARGIN_PERCENT: Decimal = dec!(20);

/// Delivery state of a line's message
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmsStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

/// Campaign pricing line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingLine {
    pub customer: Option<String>,
    pub customer_name: Option<String>,
    pub customer_mobile: Option<String>,
    pub item_code: Option<String>,
    pub item_name: Option<String>,
    pub base_rate: Option<Decimal>,
    pub qty: Option<Decimal>,
    pub margin_mode: MarginMode,
    pub margin_percent: Decimal,
    pub margin_amount: Decimal,
    pub unit_price_with_margin: Option<Decimal>,
    pub line_amount: Option<Decimal>,
    pub selected_for_sending: bool,
    pub sms_sent: bool,
    pub sms_status: SmsStatus,
}

impl Default for PricingLine {
    fn default() -> Self {
        Self {
            customer: None,
            customer_name: None,
            customer_mobile: None,
            item_code: None,
            item_name: None,
            base_rate: None,
            qty: Some(Decimal::ONE),
            margin_mode: MarginMode::Percentage,
            margin_percent: Decimal::ZERO,
            margin_amount: Decimal::ZERO,
            unit_price_with_margin: None,
            line_amount: None,
            selected_for_sending: true,
            sms_sent: false,
            sms_status: SmsStatus::Pending,
        }
    }
}

impl PricingLine {
    /// Row as added from the form: qty 1, 20% margin, selected for sending
    pub fn new_row() -> Self {
        Self {
            margin_percent: NEW_ROW_MARGIN_PERCENT,
            ..Self::default()
        }
    }

    // =========================================================================
    // Builders
    // =========================================================================

    pub fn with_customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.customer_mobile = Some(mobile.into());
        self
    }

    pub fn with_item(mut self, item_code: impl Into<String>) -> Self {
        self.item_code = Some(item_code.into());
        self
    }

    pub fn with_item_name(mut self, name: impl Into<String>) -> Self {
        self.item_name = Some(name.into());
        self
    }

    pub fn with_base_rate(mut self, rate: Decimal) -> Self {
        self.base_rate = Some(rate);
        self
    }

    pub fn with_qty(mut self, qty: Decimal) -> Self {
        self.qty = Some(qty);
        self
    }

    pub fn with_percentage_margin(mut self, percent: Decimal) -> Self {
        self.set_margin_mode(MarginMode::Percentage);
        self.margin_percent = percent;
        self
    }

    pub fn with_amount_margin(mut self, amount: Decimal) -> Self {
        self.set_margin_mode(MarginMode::Amount);
        self.margin_amount = amount;
        self
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Switch margin mode, zeroing the value the new mode ignores
    pub fn set_margin_mode(&mut self, mode: MarginMode) {
        self.margin_mode = mode;
        match mode {
            MarginMode::Percentage => self.margin_amount = Decimal::ZERO,
            MarginMode::Amount => self.margin_percent = Decimal::ZERO,
        }
    }

    /// Recompute derived prices. Returns `None` and leaves the line untouched
    /// when base rate or quantity is missing.
    pub fn reprice(&mut self) -> Option<LinePrice> {
        let price = price_line(self)?;
        self.unit_price_with_margin = Some(price.unit_price_with_margin);
        self.line_amount = Some(price.line_amount);
        Some(price)
    }

    /// Rewrite the mobile field into normalized form
    pub fn normalize_mobile(&mut self, country_code: &str) {
        self.customer_mobile = PhoneNumber::normalize_optional(self.customer_mobile.as_deref(), country_code)
            .map(PhoneNumber::into_string);
    }

    /// Field-level checks
    pub fn validate(&self) -> SmsResult<()> {
        if let Some(rate) = self.base_rate {
            if rate < Decimal::ZERO {
                return Err(SmsError::Validation("base rate cannot be negative".into()));
            }
        }

        if self.margin_mode == MarginMode::Percentage && self.margin_percent < dec!(-100) {
            return Err(SmsError::Validation("margin cannot be below -100%".into()));
        }

        if let Some(qty) = self.qty {
            if qty <= Decimal::ZERO {
                return Err(SmsError::Validation("quantity must be positive".into()));
            }
        }

        Ok(())
    }

    /// Has a mobile and a computed price
    pub fn is_ready_to_send(&self) -> bool {
        has_text(&self.customer_mobile)
            && self.unit_price_with_margin.map(|p| !p.is_zero()).unwrap_or(false)
    }

    /// Selected and not yet delivered
    pub fn is_pending(&self) -> bool {
        self.selected_for_sending && !self.sms_sent
    }

    /// Base rate times quantity; missing rate counts as zero, missing qty as one
    pub fn base_amount(&self) -> Decimal {
        self.base_rate.unwrap_or_default() * self.qty.unwrap_or(Decimal::ONE)
    }

    /// Customer label for messages
    pub fn display_customer(&self) -> &str {
        first_text(&self.customer_name, &self.customer)
    }

    /// Item label for messages
    pub fn display_item(&self) -> &str {
        first_text(&self.item_name, &self.item_code)
    }
}

pub(crate) fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

fn first_text<'a>(preferred: &'a Option<String>, fallback: &'a Option<String>) -> &'a str {
    if has_text(preferred) {
        preferred.as_deref().unwrap_or_default()
    } else {
        fallback.as_deref().unwrap_or_default()
    }
}
