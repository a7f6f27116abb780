//! Error types for the SMS pricing core

use thiserror::Error;

/// SMS core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmsError {
    /// A record field failed validation
    #[error("validation error: {0}")]
    Validation(String),

    /// Sender name rejected
    #[error("invalid sender '{name}': {reason}")]
    InvalidSender { name: String, reason: String },

    /// Phone number unusable for dispatch
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),

    /// Event reminder settings rejected
    #[error("invalid reminder settings: {0}")]
    InvalidReminder(String),

    /// Gateway call failed
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Rate or customer lookup failed
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type for the SMS core
pub type SmsResult<T> = Result<T, SmsError>;
