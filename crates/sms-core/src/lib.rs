//! SMS pricing campaign core
//!
//! Pricing, validation and messaging rules for SMS price-offer campaigns and
//! event reminders, laid out as domain, ports and application layers.
//!
//! ## Architecture
//!
//! - **Domain Layer**: pricing lines, campaigns, reminder rules, value objects
//! - **Application Layer**: sending, autofill and sender selection services
//! - **Ports Layer**: gateway, lookup and calendar interfaces
//! - **Infrastructure Layer**: in-memory adapters
//!
//! ## Flow
//!
//! Edit a line, reprice it, then read campaign totals. Both steps are explicit:
//!
//! ```
//! use rust_decimal_macros::dec;
//! use sms_core::{Campaign, PricingLine};
//!
//! let mut campaign = Campaign::create("Spring offer", "EUR");
//! let index = campaign.add_line(
//!     PricingLine::new_row().with_customer("C1").with_base_rate(dec!(100)).with_qty(dec!(2)),
//! );
//! campaign.reprice_line(index);
//!
//! let totals = campaign.totals(dec!(0.10));
//! assert_eq!(totals.estimated_revenue, dec!(240));
//! assert_eq!(totals.average_margin_percent, dec!(20));
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

// Re-exports for convenience
pub use application::{CampaignDocument, CampaignService, CampaignSummary, ReminderService, SenderSelector};
pub use config::{DigitBounds, SenderRules, SmsConfig, DEFAULT_CAMPAIGN_TEMPLATE};
pub use domain::aggregates::{Campaign, CampaignStatus, PricingLine, ReminderSettings, SmsStatus};
pub use domain::events::{CampaignEvent, DomainEvent};
pub use domain::services::{aggregate, price_line, render, validate_template, CampaignTotals, LinePrice};
pub use domain::value_objects::{normalize, validate_sender, MarginMode, PhoneNumber, SenderVerdict, Severity};
pub use error::{SmsError, SmsResult};
pub use ports::outbound::{CustomerLookup, GatewayResponse, RateLookup, SenderDirectory, SmsGateway};
