//! Sender selection
//!
//! Order: the configured default (created on demand), then the first
//! registered sender, then the fallback names, each created until one sticks.

use std::sync::Arc;

use crate::application::dto::SenderAvailability;
use crate::config::SenderRules;
use crate::domain::value_objects::SenderName;
use crate::error::{SmsError, SmsResult};
use crate::ports::outbound::SenderDirectory;

const SENDER_DESCRIPTION: &str = "SMS campaign sender";

/// Picks the sender name used for outgoing messages
pub struct SenderSelector {
    directory: Arc<dyn SenderDirectory>,
    default_sender: Option<String>,
    fallbacks: Vec<String>,
    rules: SenderRules,
}

impl SenderSelector {
    pub fn new(
        directory: Arc<dyn SenderDirectory>,
        default_sender: Option<String>,
        fallbacks: Vec<String>,
        rules: SenderRules,
    ) -> Self {
        Self {
            directory,
            default_sender: default_sender.filter(|s| !s.trim().is_empty()),
            fallbacks,
            rules,
        }
    }

    /// Make sure `name` exists, creating it when missing
    pub async fn ensure(&self, name: &str) -> SmsResult<SenderAvailability> {
        let sender = SenderName::parse(name, self.rules)?;

        let existing = self.directory.list_senders().await?;
        if existing.iter().any(|s| s == sender.as_str()) {
            return Ok(SenderAvailability { sender: sender.as_str().to_string(), created: false });
        }

        let response = self.directory.create_sender(sender.as_str(), SENDER_DESCRIPTION).await?;
        if !response.success {
            return Err(SmsError::Gateway(response.message));
        }

        tracing::info!(sender = %sender, "Created SMS sender");
        Ok(SenderAvailability { sender: sender.as_str().to_string(), created: true })
    }

    /// Best sender available right now
    pub async fn best_sender(&self) -> SmsResult<String> {
        if let Some(default) = &self.default_sender {
            match self.ensure(default).await {
                Ok(availability) => return Ok(availability.sender),
                Err(e) => tracing::warn!(sender = %default, error = %e, "Default sender unavailable"),
            }
        }

        let existing = self.directory.list_senders().await?;
        if let Some(first) = existing.into_iter().next() {
            tracing::debug!(sender = %first, "Using first registered sender");
            return Ok(first);
        }

        for name in &self.fallbacks {
            match self.directory.create_sender(name, SENDER_DESCRIPTION).await {
                Ok(response) if response.success => {
                    tracing::info!(sender = %name, "Created fallback sender");
                    return Ok(name.clone());
                }
                Ok(response) => tracing::debug!(sender = %name, reason = %response.message, "Fallback sender refused"),
                Err(e) => tracing::debug!(sender = %name, error = %e, "Fallback sender failed"),
            }
        }

        Err(SmsError::Gateway("no usable SMS sender could be found or created".into()))
    }
}
