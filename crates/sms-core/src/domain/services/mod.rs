//! Domain services module
//!
//! Stateless pricing, aggregation and templating rules.

pub mod aggregator;
pub mod pricer;
pub mod template;

pub use aggregator::{aggregate, CampaignRoi, CampaignTotals};
pub use pricer::{price_line, LinePrice};
pub use template::{
    placeholders, render, segment_count, validate_template, TemplateContext, TemplateReport,
    CAMPAIGN_REQUIRED_VARIABLES, CAMPAIGN_VARIABLES, REMINDER_VARIABLES,
};
