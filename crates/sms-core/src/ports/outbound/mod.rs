//! Outbound ports
//!
//! Hexagonal architecture: these are the interfaces that infrastructure must
//! implement. Every method is async and fallible; a refusal that the remote
//! side reports cleanly comes back as a `GatewayResponse` with
//! `success == false`, a transport failure as `Err`.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{CalendarEvent, EventContact};
use crate::domain::DomainEvent;
use crate::error::SmsResult;

/// SMS gateway port
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Check credentials and reachability
    async fn test_connection(&self) -> SmsResult<GatewayResponse>;

    /// Remaining credits
    async fn balance(&self) -> SmsResult<GatewayResponse>;

    /// Send one message. `sender` of `None` lets the gateway choose.
    async fn send(&self, message: &str, to: &str, sender: Option<&str>) -> SmsResult<GatewayResponse>;
}

/// Registered sender names
#[async_trait]
pub trait SenderDirectory: Send + Sync {
    async fn list_senders(&self) -> SmsResult<Vec<String>>;

    async fn create_sender(&self, name: &str, description: &str) -> SmsResult<GatewayResponse>;
}

/// Item valuation lookup
#[async_trait]
pub trait RateLookup: Send + Sync {
    /// `None` when the item has no known valuation
    async fn valuation_rate(&self, item_code: &str) -> SmsResult<Option<Decimal>>;
}

/// Customer contact lookup
#[async_trait]
pub trait CustomerLookup: Send + Sync {
    /// Raw mobile number as stored, not normalized
    async fn mobile(&self, customer: &str) -> SmsResult<Option<String>>;
}

/// Calendar read access for reminders
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Events starting inside `[start, end]`
    async fn events_starting_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> SmsResult<Vec<CalendarEvent>>;

    async fn participants(&self, event_name: &str) -> SmsResult<Vec<EventContact>>;
}

/// Event publisher port
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish domain events
    async fn publish(&self, events: Vec<DomainEvent>) -> SmsResult<()>;
}

/// Response envelope shared by gateway and sender operations
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub senders: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl GatewayResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender_used = Some(sender.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_envelope_shape() {
        let json = serde_json::to_value(GatewayResponse::ok("sent").with_sender("ACME")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["sender_used"], "ACME");
        assert!(json.get("credits").is_none());
    }

    #[test]
    fn test_response_parses_partial_payload() {
        let response: GatewayResponse =
            serde_json::from_str(r#"{"success": true, "message": "ok", "credits": 98.5, "service_name": "sms-ab12"}"#)
                .unwrap();
        assert_eq!(response.credits, Some(98.5));
        assert_eq!(response.service_name.as_deref(), Some("sms-ab12"));
        assert!(response.senders.is_none());
    }
}
