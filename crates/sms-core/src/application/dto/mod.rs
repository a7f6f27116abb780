//! Data Transfer Objects (DTOs)
//!
//! Objects for transferring data across boundaries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::SmsConfig;
use crate::domain::aggregates::{Campaign, CampaignStatus, PricingLine, RecipientKind};
use crate::domain::services::{CampaignRoi, CampaignTotals};
use crate::ports::outbound::GatewayResponse;

// =============================================================================
// Campaign input
// =============================================================================

/// Campaign as written in a JSON, YAML or TOML file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignDocument {
    pub title: String,
    pub company: Option<String>,
    pub currency: Option<String>,
    pub sms_template: Option<String>,
    pub lines: Vec<PricingLine>,
}

impl CampaignDocument {
    /// Build the aggregate, normalizing mobiles and pricing every line
    pub fn into_campaign(self, config: &SmsConfig) -> Campaign {
        let currency = self.currency.unwrap_or_else(|| config.currency.clone());
        let mut campaign = Campaign::create(self.title, currency);
        if let Some(company) = self.company {
            campaign.set_company(company);
        }
        if let Some(template) = self.sms_template {
            campaign.set_template(template);
        }
        for line in self.lines {
            campaign.add_line(line);
        }
        campaign.normalize_mobiles(&config.default_country_code);
        campaign.reprice_all();
        campaign.refresh_status();
        campaign
    }

    /// Snapshot of an aggregate's editable state
    pub fn from_campaign(campaign: &Campaign) -> Self {
        Self {
            title: campaign.title().to_string(),
            company: campaign.company().map(str::to_string),
            currency: Some(campaign.currency().to_string()),
            sms_template: campaign.sms_template().map(str::to_string),
            lines: campaign.lines().to_vec(),
        }
    }
}

/// Totals plus ROI, as reported to callers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub title: String,
    pub status: CampaignStatus,
    pub currency: String,
    pub totals: CampaignTotals,
    pub roi: CampaignRoi,
}

impl CampaignSummary {
    pub fn of(campaign: &Campaign, per_message_cost: Decimal) -> Self {
        let totals = campaign.totals(per_message_cost);
        Self {
            title: campaign.title().to_string(),
            status: campaign.status(),
            currency: campaign.currency().to_string(),
            roi: CampaignRoi::from_totals(&totals),
            totals,
        }
    }
}

// =============================================================================
// Send results
// =============================================================================

/// Outcome of one line in a batch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SendDetail {
    pub line: usize,
    pub customer: String,
    pub item: String,
    pub success: bool,
    pub message: String,
}

/// Outcome of a campaign batch
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SendReport {
    pub sent: usize,
    pub failed: usize,
    pub sender: Option<String>,
    pub details: Vec<SendDetail>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SendReport {
    pub fn push(&mut self, detail: SendDetail) {
        if detail.success {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
        self.details.push(detail);
    }
}

/// Result of a sender lookup or creation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderAvailability {
    pub sender: String,
    pub created: bool,
}

/// One reminder delivery attempt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReminderDelivery {
    pub event: String,
    pub recipient: String,
    pub kind: RecipientKind,
    pub mobile: String,
    pub message: String,
    pub response: GatewayResponse,
}

/// Outcome of one reminder run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReminderRunReport {
    /// Set when the run did nothing, with the reason
    pub skipped: Option<String>,
    pub events_checked: usize,
    pub sent: u64,
    pub failed: u64,
    pub deliveries: Vec<ReminderDelivery>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_document_into_campaign() {
        let doc: CampaignDocument = serde_json::from_str(
            r#"{
                "title": "Spring",
                "lines": [
                    {"customer": "C1", "customer_mobile": "06 12 34 56 78", "item_code": "SKU-1",
                     "base_rate": 100, "margin_percent": 20},
                    {"customer": "C2", "item_code": "SKU-2"}
                ]
            }"#,
        )
        .unwrap();

        let campaign = doc.into_campaign(&SmsConfig::default());
        assert_eq!(campaign.currency(), "EUR");
        assert_eq!(campaign.line(0).unwrap().customer_mobile.as_deref(), Some("+33612345678"));
        assert_eq!(campaign.line(0).unwrap().line_amount, Some(dec!(120)));
        assert_eq!(campaign.line(1).unwrap().line_amount, None);
        assert_eq!(campaign.status(), CampaignStatus::Draft);
    }

    #[test]
    fn test_document_round_trips_through_aggregate() {
        let doc = CampaignDocument {
            title: "Spring".into(),
            sms_template: Some("{{customer_name}}".into()),
            ..Default::default()
        };
        let campaign = doc.into_campaign(&SmsConfig::default());
        let back = CampaignDocument::from_campaign(&campaign);
        assert_eq!(back.sms_template.as_deref(), Some("{{customer_name}}"));
        assert_eq!(back.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_report_counts() {
        let mut report = SendReport::default();
        let detail = |success| SendDetail {
            line: 0,
            customer: "C1".into(),
            item: "SKU".into(),
            success,
            message: String::new(),
        };
        report.push(detail(true));
        report.push(detail(false));
        report.push(detail(true));
        assert_eq!((report.sent, report.failed), (2, 1));
    }
}
