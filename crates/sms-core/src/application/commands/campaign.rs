//! Campaign use cases
//!
//! Rate and mobile autofill, batch sending and test messages. The service
//! never aggregates on its own; callers read totals from the campaign after.

use chrono::Utc;
use std::sync::Arc;

use crate::application::commands::sender::SenderSelector;
use crate::application::dto::{SendDetail, SendReport};
use crate::config::SmsConfig;
use crate::domain::aggregates::{Campaign, CampaignStatus, MessagePreview, PricingLine};
use crate::domain::value_objects::PhoneNumber;
use crate::error::{SmsError, SmsResult};
use crate::ports::outbound::{CustomerLookup, EventPublisher, GatewayResponse, RateLookup, SmsGateway};

/// Name shown in test messages
pub const TEST_CUSTOMER_NAME: &str = "Client Test";

/// Campaign application service
pub struct CampaignService {
    gateway: Arc<dyn SmsGateway>,
    senders: SenderSelector,
    rates: Arc<dyn RateLookup>,
    customers: Arc<dyn CustomerLookup>,
    event_publisher: Arc<dyn EventPublisher>,
    config: SmsConfig,
}

impl CampaignService {
    pub fn new(
        gateway: Arc<dyn SmsGateway>,
        senders: SenderSelector,
        rates: Arc<dyn RateLookup>,
        customers: Arc<dyn CustomerLookup>,
        event_publisher: Arc<dyn EventPublisher>,
        config: SmsConfig,
    ) -> Self {
        Self {
            gateway,
            senders,
            rates,
            customers,
            event_publisher,
            config,
        }
    }

    pub fn config(&self) -> &SmsConfig {
        &self.config
    }

    /// Fill missing base rates from the valuation lookup.
    ///
    /// Lookups run concurrently, one task per line with an item code and no
    /// rate. Resolved lines are repriced; returns how many were filled.
    pub async fn autofill_rates(&self, campaign: &mut Campaign) -> SmsResult<usize> {
        let mut handles = Vec::new();
        for (index, line) in campaign.lines().iter().enumerate() {
            let needs_rate = line.base_rate.map(|r| r.is_zero()).unwrap_or(true);
            let Some(item_code) = line.item_code.clone().filter(|c| !c.trim().is_empty()) else {
                continue;
            };
            if !needs_rate {
                continue;
            }

            let rates = Arc::clone(&self.rates);
            handles.push(tokio::spawn(async move {
                let rate = rates.valuation_rate(&item_code).await;
                (index, item_code, rate)
            }));
        }

        let mut filled = 0;
        for handle in handles {
            let (index, item_code, rate) = handle
                .await
                .map_err(|e| SmsError::Lookup(format!("rate lookup task failed: {}", e)))?;

            match rate {
                Ok(Some(rate)) => {
                    if let Some(line) = campaign.line_mut(index) {
                        line.base_rate = Some(rate);
                    }
                    campaign.reprice_line(index);
                    filled += 1;
                }
                Ok(None) => tracing::debug!(item = %item_code, "No valuation rate found"),
                Err(e) => tracing::warn!(item = %item_code, error = %e, "Valuation lookup failed"),
            }
        }

        tracing::info!(campaign = %campaign.id(), filled, "Autofilled base rates");
        Ok(filled)
    }

    /// Fill missing mobiles from the customer lookup, normalized. A failed
    /// lookup leaves its line untouched.
    pub async fn autofill_mobiles(&self, campaign: &mut Campaign) -> SmsResult<usize> {
        let wanted: Vec<(usize, String)> = campaign
            .lines()
            .iter()
            .enumerate()
            .filter(|(_, line)| line.customer_mobile.as_deref().map(|m| m.trim().is_empty()).unwrap_or(true))
            .filter_map(|(index, line)| {
                line.customer
                    .clone()
                    .filter(|c| !c.trim().is_empty())
                    .map(|customer| (index, customer))
            })
            .collect();

        let mut filled = 0;
        for (index, customer) in wanted {
            let mobile = match self.customers.mobile(&customer).await {
                Ok(mobile) => mobile,
                Err(e) => {
                    tracing::warn!(customer = %customer, error = %e, "Mobile lookup failed");
                    continue;
                }
            };
            let normalized = PhoneNumber::normalize_optional(mobile.as_deref(), &self.config.default_country_code);
            if let (Some(phone), Some(line)) = (normalized, campaign.line_mut(index)) {
                line.customer_mobile = Some(phone.into_string());
                filled += 1;
            }
        }

        tracing::debug!(campaign = %campaign.id(), filled, "Autofilled mobiles");
        Ok(filled)
    }

    /// Preview of the first selected lines
    pub fn preview(&self, campaign: &Campaign) -> Vec<MessagePreview> {
        campaign.previews(self.config.preview_limit, &self.config.default_template)
    }

    /// Send to every selected line not yet sent.
    ///
    /// A failing line is recorded and the batch carries on. Status is
    /// refreshed and domain events published once the batch ends.
    pub async fn send_selected(&self, campaign: &mut Campaign) -> SmsResult<SendReport> {
        if campaign.status() == CampaignStatus::Cancelled {
            return Err(SmsError::Validation("campaign is cancelled".into()));
        }

        let pending = campaign.pending_indices();
        let mut report = SendReport::default();
        if pending.is_empty() {
            tracing::info!(campaign = %campaign.id(), "Nothing to send");
            return Ok(report);
        }

        let sender = self.senders.best_sender().await?;
        report.sender = Some(sender.clone());

        for index in pending {
            let Some(line) = campaign.line(index) else { continue };
            let mut detail = SendDetail {
                line: index,
                customer: line.display_customer().to_string(),
                item: line.display_item().to_string(),
                success: false,
                message: String::new(),
            };

            let outcome = self.send_line(campaign, line, &sender).await;
            match &outcome {
                Ok(message) => detail.message = message.clone(),
                Err(reason) => detail.message = reason.clone(),
            }
            detail.success = outcome.is_ok();
            campaign.record_outcome(index, outcome.map(|_| ()))?;
            report.push(detail);
        }

        campaign.refresh_status();
        report.finished_at = Some(Utc::now());

        self.event_publisher.publish(campaign.take_events()).await?;

        tracing::info!(
            campaign = %campaign.id(),
            sent = report.sent,
            failed = report.failed,
            status = ?campaign.status(),
            "Campaign batch finished"
        );
        Ok(report)
    }

    /// Send the first line's message to a test number, as "Client Test"
    pub async fn send_test(&self, campaign: &Campaign, test_mobile: &str) -> SmsResult<GatewayResponse> {
        let first = campaign
            .line(0)
            .ok_or_else(|| SmsError::Validation("campaign has no lines".into()))?;

        let phone = PhoneNumber::parse_strict(
            test_mobile,
            &self.config.default_country_code,
            self.config.strict_phone_digits,
        )?;

        let mut sample: PricingLine = first.clone();
        sample.customer_name = Some(TEST_CUSTOMER_NAME.into());
        sample.customer_mobile = Some(phone.as_str().to_string());
        let message = campaign.render_message(&sample, &self.config.default_template);

        let sender = self.senders.best_sender().await?;
        let response = self.gateway.send(&message, phone.as_str(), Some(&sender)).await?;
        tracing::info!(to = %phone, success = response.success, "Test message dispatched");

        Ok(response.with_content(message))
    }

    /// Dispatch one line; `Ok` carries the gateway message, `Err` the reason
    async fn send_line(&self, campaign: &Campaign, line: &PricingLine, sender: &str) -> Result<String, String> {
        let mobile = line
            .customer_mobile
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| "mobile number missing".to_string())?;

        let phone = PhoneNumber::parse_strict(
            mobile,
            &self.config.default_country_code,
            self.config.strict_phone_digits,
        )
        .map_err(|e| e.to_string())?;

        let message = campaign.render_message(line, &self.config.default_template);
        match self.gateway.send(&message, phone.as_str(), Some(sender)).await {
            Ok(response) if response.success => Ok(response.message),
            Ok(response) => Err(response.message),
            Err(e) => Err(e.to_string()),
        }
    }
}
