//! Aggregates module

pub mod campaign;
pub mod pricing_line;
pub mod reminder;

pub use campaign::{money, Campaign, CampaignStatus, MessagePreview};
pub use pricing_line::{PricingLine, SmsStatus, NEW_ROW_MARGIN_PERCENT};
pub use reminder::{
    event_is_eligible, parse_reminder_times, reminder_context, CalendarEvent, EventContact, EventDetails,
    RecipientKind, ReminderSettings, ReminderStats, ReminderWindow,
};
