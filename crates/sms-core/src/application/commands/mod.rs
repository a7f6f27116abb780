//! Command handlers
//!
//! Application services that orchestrate use cases.

pub mod campaign;
pub mod reminder;
pub mod sender;

pub use campaign::CampaignService;
pub use reminder::ReminderService;
pub use sender::SenderSelector;
