//! Campaign Aggregate
//!
//! Ordered pricing lines plus send bookkeeping. Totals are never stored: they
//! are recomputed from the lines on every call to [`Campaign::totals`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::pricing_line::{has_text, PricingLine, SmsStatus};
use crate::domain::events::{CampaignEvent, DomainEvent};
use crate::domain::services::aggregator::{aggregate, CampaignRoi, CampaignTotals};
use crate::domain::services::pricer::LinePrice;
use crate::domain::services::template::{render, TemplateContext};
use crate::domain::value_objects::EntityId;
use crate::error::{SmsError, SmsResult};

/// Campaign aggregate root
#[derive(Clone, Debug)]
pub struct Campaign {
    id: EntityId,
    title: String,
    company: Option<String>,
    currency: String,
    sms_template: Option<String>,
    lines: Vec<PricingLine>,
    status: CampaignStatus,
    sms_sent_count: u64,
    sms_failed_count: u64,
    last_sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Campaign {
    /// Create an empty campaign
    pub fn create(title: impl Into<String>, currency: impl Into<String>) -> Self {
        let now = Utc::now();
        let id = EntityId::new();
        let title = title.into();

        let mut campaign = Self {
            id: id.clone(),
            title: title.clone(),
            company: None,
            currency: currency.into(),
            sms_template: None,
            lines: vec![],
            status: CampaignStatus::Draft,
            sms_sent_count: 0,
            sms_failed_count: 0,
            last_sent_at: None,
            created_at: now,
            updated_at: now,
            events: vec![],
        };

        campaign.raise_event(DomainEvent::Campaign(CampaignEvent::Created {
            campaign_id: id,
            title,
            created_at: now,
        }));

        campaign
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> &EntityId { &self.id }
    pub fn title(&self) -> &str { &self.title }
    pub fn company(&self) -> Option<&str> { self.company.as_deref() }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn sms_template(&self) -> Option<&str> { self.sms_template.as_deref() }
    pub fn lines(&self) -> &[PricingLine] { &self.lines }
    pub fn line(&self, index: usize) -> Option<&PricingLine> { self.lines.get(index) }
    pub fn status(&self) -> CampaignStatus { self.status }
    pub fn sms_sent_count(&self) -> u64 { self.sms_sent_count }
    pub fn sms_failed_count(&self) -> u64 { self.sms_failed_count }
    pub fn last_sent_at(&self) -> Option<DateTime<Utc>> { self.last_sent_at }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    // =========================================================================
    // Lines
    // =========================================================================

    pub fn set_company(&mut self, company: impl Into<String>) {
        self.company = Some(company.into());
        self.touch();
    }

    pub fn set_template(&mut self, template: impl Into<String>) {
        self.sms_template = Some(template.into());
        self.touch();
    }

    /// Append a line and return its index
    pub fn add_line(&mut self, line: PricingLine) -> usize {
        self.lines.push(line);
        self.touch();
        self.lines.len() - 1
    }

    pub fn remove_line(&mut self, index: usize) -> Option<PricingLine> {
        if index >= self.lines.len() {
            return None;
        }
        self.touch();
        Some(self.lines.remove(index))
    }

    /// Mutable access for field edits. Call [`Campaign::reprice_line`] after.
    pub fn line_mut(&mut self, index: usize) -> Option<&mut PricingLine> {
        self.updated_at = Utc::now();
        self.lines.get_mut(index)
    }

    /// First step after an edit: recompute one line's prices
    pub fn reprice_line(&mut self, index: usize) -> Option<LinePrice> {
        let price = self.lines.get_mut(index)?.reprice();
        if price.is_some() {
            self.touch();
        }
        price
    }

    /// Recompute every line; returns how many were computable
    pub fn reprice_all(&mut self) -> usize {
        let priced = self.lines.iter_mut().filter_map(|line| line.reprice()).count();
        self.touch();
        priced
    }

    /// Normalize every line's mobile number
    pub fn normalize_mobiles(&mut self, country_code: &str) {
        for line in &mut self.lines {
            line.normalize_mobile(country_code);
        }
    }

    // =========================================================================
    // Totals
    // =========================================================================

    /// Second step after an edit: campaign-level totals from current lines
    pub fn totals(&self, per_message_cost: Decimal) -> CampaignTotals {
        aggregate(&self.lines, per_message_cost)
    }

    pub fn roi(&self, per_message_cost: Decimal) -> CampaignRoi {
        CampaignRoi::from_totals(&self.totals(per_message_cost))
    }

    // =========================================================================
    // Validation & status
    // =========================================================================

    /// Checks run before a campaign can be submitted for sending
    pub fn validate_for_submit(&self) -> SmsResult<()> {
        if self.lines.is_empty() {
            return Err(SmsError::Validation("add at least one item and customer".into()));
        }

        for (index, line) in self.lines.iter().enumerate() {
            let row = index + 1;
            line.validate().map_err(|e| match e {
                SmsError::Validation(reason) => SmsError::Validation(format!("row {}: {}", row, reason)),
                other => other,
            })?;

            if !has_text(&line.customer) {
                return Err(SmsError::Validation(format!("row {}: customer required", row)));
            }
            if !has_text(&line.item_code) {
                return Err(SmsError::Validation(format!("row {}: item required", row)));
            }
            if !has_text(&line.customer_mobile) {
                return Err(SmsError::Validation(format!(
                    "row {}: mobile number required for customer {}",
                    row,
                    line.display_customer()
                )));
            }
            if !line.base_rate.map(|r| r > Decimal::ZERO).unwrap_or(false) {
                return Err(SmsError::Validation(format!(
                    "row {}: base rate required for {}",
                    row,
                    line.display_item()
                )));
            }
        }

        Ok(())
    }

    /// Every line has a mobile and a computed price
    pub fn is_ready_to_send(&self) -> bool {
        !self.lines.is_empty() && self.lines.iter().all(PricingLine::is_ready_to_send)
    }

    /// Derive status from the lines. Cancelled campaigns stay cancelled.
    pub fn refresh_status(&mut self) -> CampaignStatus {
        if self.status == CampaignStatus::Cancelled {
            return self.status;
        }

        let sent = self.lines.iter().filter(|l| l.sms_sent).count();
        let next = if self.lines.is_empty() {
            CampaignStatus::Draft
        } else if sent == 0 {
            if self.is_ready_to_send() {
                CampaignStatus::Ready
            } else {
                CampaignStatus::Draft
            }
        } else if sent == self.lines.len() {
            CampaignStatus::Sent
        } else {
            CampaignStatus::PartiallySent
        };

        self.set_status(next);
        self.status
    }

    pub fn cancel(&mut self) {
        self.set_status(CampaignStatus::Cancelled);
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Campaign template, or `default` when none is set
    pub fn template_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.sms_template
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(default)
    }

    /// Substitution values for one line
    pub fn message_context(&self, line: &PricingLine) -> TemplateContext {
        let base_rate = line.base_rate.unwrap_or_default();
        let margin_per_unit = match line.unit_price_with_margin {
            Some(unit) => unit - base_rate,
            None => line.margin_amount,
        };

        let mut context = TemplateContext::new();
        context.insert("customer_name".into(), line.display_customer().to_string());
        context.insert("item_name".into(), line.display_item().to_string());
        context.insert("item_code".into(), line.item_code.clone().unwrap_or_default());
        context.insert("final_price".into(), money(line.unit_price_with_margin.unwrap_or_default()));
        context.insert("amount".into(), money(line.line_amount.unwrap_or_default()));
        context.insert("currency".into(), self.currency.clone());
        context.insert("valuation_rate".into(), money(base_rate));
        context.insert("margin_eur".into(), money(margin_per_unit));
        context.insert("qty".into(), line.qty.unwrap_or(Decimal::ONE).normalize().to_string());
        context.insert("company".into(), self.company.clone().unwrap_or_default());
        context.insert("campaign_title".into(), self.title.clone());
        context
    }

    /// Render the message a line's customer would receive
    pub fn render_message(&self, line: &PricingLine, default_template: &str) -> String {
        render(self.template_or(default_template), &self.message_context(line))
    }

    /// Message for the line at `index`
    pub fn message_for(&self, index: usize, default_template: &str) -> Option<String> {
        self.lines
            .get(index)
            .map(|line| self.render_message(line, default_template))
    }

    /// Messages for the first `limit` lines selected for sending
    pub fn previews(&self, limit: usize, default_template: &str) -> Vec<MessagePreview> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.selected_for_sending)
            .take(limit)
            .map(|(index, line)| MessagePreview {
                line: index,
                customer: line.display_customer().to_string(),
                mobile: line.customer_mobile.clone(),
                item: line.display_item().to_string(),
                price: line.unit_price_with_margin,
                valuation: line.base_rate,
                message: self.render_message(line, default_template),
            })
            .collect()
    }

    /// Lines selected and not yet sent
    pub fn pending_indices(&self) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.is_pending())
            .map(|(index, _)| index)
            .collect()
    }

    // =========================================================================
    // Send bookkeeping
    // =========================================================================

    /// Apply a gateway outcome to one line
    pub fn record_outcome(&mut self, index: usize, outcome: Result<(), String>) -> SmsResult<()> {
        match outcome {
            Ok(()) => self.mark_sent(index),
            Err(reason) => self.mark_failed(index, reason),
        }
    }

    pub fn mark_sent(&mut self, index: usize) -> SmsResult<()> {
        let campaign_id = self.id.clone();
        let now = Utc::now();
        let line = self.line_for_update(index)?;
        line.sms_sent = true;
        line.sms_status = SmsStatus::Sent;
        let mobile = line.customer_mobile.clone().unwrap_or_default();

        self.sms_sent_count += 1;
        self.last_sent_at = Some(now);
        self.touch();
        self.raise_event(DomainEvent::Campaign(CampaignEvent::MessageSent {
            campaign_id,
            line: index,
            mobile,
            sent_at: now,
        }));
        Ok(())
    }

    pub fn mark_failed(&mut self, index: usize, reason: impl Into<String>) -> SmsResult<()> {
        let campaign_id = self.id.clone();
        let line = self.line_for_update(index)?;
        line.sms_status = SmsStatus::Failed;

        self.sms_failed_count += 1;
        self.touch();
        self.raise_event(DomainEvent::Campaign(CampaignEvent::MessageFailed {
            campaign_id,
            line: index,
            reason: reason.into(),
            failed_at: Utc::now(),
        }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Private
    // =========================================================================

    fn line_for_update(&mut self, index: usize) -> SmsResult<&mut PricingLine> {
        self.lines
            .get_mut(index)
            .ok_or_else(|| SmsError::Validation(format!("no line at index {}", index)))
    }

    fn set_status(&mut self, next: CampaignStatus) {
        if self.status == next {
            return;
        }
        let from = self.status;
        self.status = next;
        self.touch();
        self.raise_event(DomainEvent::Campaign(CampaignEvent::StatusChanged {
            campaign_id: self.id.clone(),
            from,
            to: next,
        }));
    }

    fn raise_event(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Two-decimal currency rendering
pub fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

// =============================================================================
// Supporting Types
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignStatus {
    #[default]
    Draft,
    Ready,
    PartiallySent,
    Sent,
    Cancelled,
}

/// Rendered message for one selected line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessagePreview {
    pub line: usize,
    pub customer: String,
    pub mobile: Option<String>,
    pub item: String,
    pub price: Option<Decimal>,
    pub valuation: Option<Decimal>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CAMPAIGN_TEMPLATE;
    use rust_decimal_macros::dec;

    fn line(customer: &str, item: &str, base: Decimal) -> PricingLine {
        PricingLine::new_row()
            .with_customer(customer)
            .with_item(item)
            .with_mobile("+33612345678")
            .with_base_rate(base)
    }

    fn campaign() -> Campaign {
        let mut c = Campaign::create("Spring promo", "EUR");
        c.add_line(line("C1", "SKU-1", dec!(100)));
        c.add_line(line("C2", "SKU-2", dec!(50)));
        c.reprice_all();
        c
    }

    #[test]
    fn test_create_raises_event() {
        let mut c = Campaign::create("Spring promo", "EUR");
        let events = c.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "campaign.created");
        assert!(c.take_events().is_empty());
    }

    #[test]
    fn test_explicit_two_step_recalculation() {
        let mut c = campaign();
        assert_eq!(c.totals(dec!(0.10)).estimated_revenue, dec!(180));

        c.line_mut(0).unwrap().qty = Some(dec!(2));
        // Editing alone does not reprice
        assert_eq!(c.totals(dec!(0.10)).estimated_revenue, dec!(180));

        c.reprice_line(0);
        assert_eq!(c.totals(dec!(0.10)).estimated_revenue, dec!(300));
    }

    #[test]
    fn test_remove_line() {
        let mut c = campaign();
        assert!(c.remove_line(5).is_none());
        assert_eq!(c.remove_line(0).unwrap().customer.as_deref(), Some("C1"));
        assert_eq!(c.totals(dec!(0.10)).total_items, 1);
    }

    #[test]
    fn test_validate_for_submit() {
        assert!(Campaign::create("Empty", "EUR").validate_for_submit().is_err());
        assert!(campaign().validate_for_submit().is_ok());

        let mut c = campaign();
        c.line_mut(1).unwrap().customer_mobile = None;
        let err = c.validate_for_submit().unwrap_err();
        assert!(err.to_string().contains("row 2"));

        let mut c = campaign();
        c.line_mut(0).unwrap().base_rate = None;
        assert!(c.validate_for_submit().unwrap_err().to_string().contains("base rate"));
    }

    #[test]
    fn test_status_lifecycle() {
        let mut c = Campaign::create("Spring promo", "EUR");
        assert_eq!(c.refresh_status(), CampaignStatus::Draft);

        c.add_line(line("C1", "SKU-1", dec!(100)));
        assert_eq!(c.refresh_status(), CampaignStatus::Draft);

        c.reprice_all();
        assert_eq!(c.refresh_status(), CampaignStatus::Ready);

        c.add_line(line("C2", "SKU-2", dec!(10)));
        c.reprice_all();
        c.mark_sent(0).unwrap();
        assert_eq!(c.refresh_status(), CampaignStatus::PartiallySent);

        c.mark_sent(1).unwrap();
        assert_eq!(c.refresh_status(), CampaignStatus::Sent);
        assert_eq!(c.sms_sent_count(), 2);
        assert!(c.last_sent_at().is_some());
    }

    #[test]
    fn test_cancelled_is_sticky() {
        let mut c = campaign();
        c.cancel();
        assert_eq!(c.refresh_status(), CampaignStatus::Cancelled);
    }

    #[test]
    fn test_status_change_events() {
        let mut c = campaign();
        c.take_events();
        c.refresh_status();
        c.refresh_status();
        let events = c.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "campaign.status_changed");
    }

    #[test]
    fn test_mark_failed() {
        let mut c = campaign();
        c.mark_failed(1, "gateway down").unwrap();
        assert_eq!(c.line(1).unwrap().sms_status, SmsStatus::Failed);
        assert!(!c.line(1).unwrap().sms_sent);
        assert_eq!(c.sms_failed_count(), 1);
        assert_eq!(c.pending_indices(), vec![0, 1]);
        assert!(c.mark_failed(9, "x").is_err());
    }

    #[test]
    fn test_pending_skips_unselected_and_sent() {
        let mut c = campaign();
        c.add_line(line("C3", "SKU-3", dec!(5)));
        c.line_mut(1).unwrap().selected_for_sending = false;
        c.mark_sent(2).unwrap();
        assert_eq!(c.pending_indices(), vec![0]);
    }

    #[test]
    fn test_default_message() {
        let c = campaign();
        let line = c.line(0).unwrap().clone().with_customer_name("Ana").with_item_name("Widget");
        assert_eq!(
            c.render_message(&line, DEFAULT_CAMPAIGN_TEMPLATE),
            "Bonjour Ana, nous vous proposons Widget au prix de 120.00€."
        );
    }

    #[test]
    fn test_custom_template_context() {
        let mut c = campaign();
        c.set_company("ACME");
        c.set_template("{{company}}/{{campaign_title}}: {{qty}}x {{item_code}} {{margin_eur}} {{currency}} {{amount}}");
        let message = c.render_message(c.line(1).unwrap(), DEFAULT_CAMPAIGN_TEMPLATE);
        assert_eq!(message, "ACME/Spring promo: 1x SKU-2 10.00 EUR 60.00");
    }

    #[test]
    fn test_previews_limited_to_selected() {
        let mut c = campaign();
        c.add_line(line("C3", "SKU-3", dec!(5)));
        c.add_line(line("C4", "SKU-4", dec!(5)));
        c.line_mut(0).unwrap().selected_for_sending = false;
        c.reprice_all();

        let previews = c.previews(2, DEFAULT_CAMPAIGN_TEMPLATE);
        assert_eq!(previews.len(), 2);
        assert_eq!(previews[0].line, 1);
        assert_eq!(previews[1].line, 2);
        assert_eq!(previews[0].price, Some(dec!(60)));
    }

    #[test]
    fn test_record_outcome() {
        let mut c = campaign();
        c.record_outcome(0, Ok(())).unwrap();
        c.record_outcome(1, Err("rejected".into())).unwrap();
        assert!(c.line(0).unwrap().sms_sent);
        assert_eq!(c.line(1).unwrap().sms_status, SmsStatus::Failed);
        assert_eq!((c.sms_sent_count(), c.sms_failed_count()), (1, 1));
    }

    #[test]
    fn test_message_for_index() {
        let c = campaign();
        let message = c.message_for(1, DEFAULT_CAMPAIGN_TEMPLATE).unwrap();
        assert_eq!(message, "Bonjour C2, nous vous proposons SKU-2 au prix de 60.00€.");
        assert!(c.message_for(7, DEFAULT_CAMPAIGN_TEMPLATE).is_none());
    }

    #[test]
    fn test_money_format() {
        assert_eq!(money(dec!(120)), "120.00");
        assert_eq!(money(dec!(0.106)), "0.11");
        assert_eq!(money(dec!(3.14159)), "3.14");
    }
}
