//! In-memory adapters for tests and offline runs

use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

use crate::domain::aggregates::{CalendarEvent, EventContact};
use crate::domain::DomainEvent;
use crate::error::{SmsError, SmsResult};
use crate::ports::outbound::{
    CalendarSource, CustomerLookup, EventPublisher, GatewayResponse, RateLookup, SenderDirectory, SmsGateway,
};

/// Message accepted by [`InMemoryGateway`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub message: String,
    pub sender: Option<String>,
}

/// Gateway that records every message and refuses configured numbers
pub struct InMemoryGateway {
    credits: Mutex<f64>,
    sent: RwLock<Vec<SentMessage>>,
    refused: RwLock<HashSet<String>>,
    offline: bool,
}

impl InMemoryGateway {
    pub fn new(credits: f64) -> Self {
        Self {
            credits: Mutex::new(credits),
            sent: RwLock::new(vec![]),
            refused: RwLock::new(HashSet::new()),
            offline: false,
        }
    }

    /// Every call fails at the transport level
    pub fn offline() -> Self {
        Self { offline: true, ..Self::new(0.0) }
    }

    /// Messages to `number` come back with `success == false`
    pub fn refuse(&self, number: impl Into<String>) {
        self.refused.write().insert(number.into());
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().clone()
    }

    fn check_online(&self) -> SmsResult<()> {
        if self.offline {
            return Err(SmsError::Gateway("gateway unreachable".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new(100.0)
    }
}

#[async_trait]
impl SmsGateway for InMemoryGateway {
    async fn test_connection(&self) -> SmsResult<GatewayResponse> {
        self.check_online()?;
        Ok(GatewayResponse {
            status: Some("enable".into()),
            service_name: Some("sms-memory".into()),
            credits: Some(*self.credits.lock()),
            ..GatewayResponse::ok("connection ok")
        })
    }

    async fn balance(&self) -> SmsResult<GatewayResponse> {
        self.check_online()?;
        Ok(GatewayResponse {
            credits: Some(*self.credits.lock()),
            ..GatewayResponse::ok("balance retrieved")
        })
    }

    async fn send(&self, message: &str, to: &str, sender: Option<&str>) -> SmsResult<GatewayResponse> {
        self.check_online()?;
        if self.refused.read().contains(to) {
            return Ok(GatewayResponse::failure(format!("receiver {} refused", to)));
        }

        let mut credits = self.credits.lock();
        if *credits < 1.0 {
            return Ok(GatewayResponse::failure("not enough credits"));
        }
        *credits -= 1.0;

        let mut sent = self.sent.write();
        sent.push(SentMessage {
            to: to.to_string(),
            message: message.to_string(),
            sender: sender.map(str::to_string),
        });

        let mut response = GatewayResponse::ok(format!("message sent to {}", to));
        response.sender_used = sender.map(str::to_string);
        response.sms_id = Some(sent.len().to_string());
        Ok(response)
    }
}

/// Sender registry; names in `rejected` cannot be created
#[derive(Default)]
pub struct InMemorySenderDirectory {
    senders: RwLock<Vec<String>>,
    rejected: HashSet<String>,
}

impl InMemorySenderDirectory {
    pub fn new(senders: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            senders: RwLock::new(senders.into_iter().map(Into::into).collect()),
            rejected: HashSet::new(),
        }
    }

    pub fn rejecting(mut self, name: impl Into<String>) -> Self {
        self.rejected.insert(name.into());
        self
    }
}

#[async_trait]
impl SenderDirectory for InMemorySenderDirectory {
    async fn list_senders(&self) -> SmsResult<Vec<String>> {
        Ok(self.senders.read().clone())
    }

    async fn create_sender(&self, name: &str, _description: &str) -> SmsResult<GatewayResponse> {
        if self.rejected.contains(name) {
            return Ok(GatewayResponse::failure(format!("sender '{}' refused", name)));
        }
        let mut senders = self.senders.write();
        if !senders.iter().any(|s| s == name) {
            senders.push(name.to_string());
        }
        Ok(GatewayResponse::ok(format!("sender '{}' created", name)))
    }
}

/// Fixed valuation rates by item code
#[derive(Default)]
pub struct StaticRateLookup {
    rates: HashMap<String, Decimal>,
    failing: HashSet<String>,
}

impl StaticRateLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, item_code: impl Into<String>, rate: Decimal) -> Self {
        self.rates.insert(item_code.into(), rate);
        self
    }

    /// Lookups for `item_code` return an error
    pub fn failing_for(mut self, item_code: impl Into<String>) -> Self {
        self.failing.insert(item_code.into());
        self
    }
}

#[async_trait]
impl RateLookup for StaticRateLookup {
    async fn valuation_rate(&self, item_code: &str) -> SmsResult<Option<Decimal>> {
        if self.failing.contains(item_code) {
            return Err(SmsError::Lookup(format!("valuation unavailable for {}", item_code)));
        }
        Ok(self.rates.get(item_code).copied())
    }
}

/// Fixed mobile numbers by customer
#[derive(Default)]
pub struct StaticCustomerLookup {
    mobiles: HashMap<String, String>,
    failing: HashSet<String>,
}

impl StaticCustomerLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mobile(mut self, customer: impl Into<String>, mobile: impl Into<String>) -> Self {
        self.mobiles.insert(customer.into(), mobile.into());
        self
    }

    /// Lookups for `customer` return an error
    pub fn failing_for(mut self, customer: impl Into<String>) -> Self {
        self.failing.insert(customer.into());
        self
    }
}

#[async_trait]
impl CustomerLookup for StaticCustomerLookup {
    async fn mobile(&self, customer: &str) -> SmsResult<Option<String>> {
        if self.failing.contains(customer) {
            return Err(SmsError::Lookup(format!("customer {} unavailable", customer)));
        }
        Ok(self.mobiles.get(customer).cloned())
    }
}

/// Calendar with fixed events and participants
#[derive(Default)]
pub struct InMemoryCalendar {
    events: Vec<CalendarEvent>,
    participants: HashMap<String, Vec<EventContact>>,
    failing: HashSet<String>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(mut self, event: CalendarEvent, participants: Vec<EventContact>) -> Self {
        self.participants.insert(event.name.clone(), participants);
        self.events.push(event);
        self
    }

    /// Participant lookups for `event_name` return an error
    pub fn failing_participants_for(mut self, event_name: impl Into<String>) -> Self {
        self.failing.insert(event_name.into());
        self
    }
}

#[async_trait]
impl CalendarSource for InMemoryCalendar {
    async fn events_starting_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> SmsResult<Vec<CalendarEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.starts_on >= start && e.starts_on <= end)
            .cloned()
            .collect())
    }

    async fn participants(&self, event_name: &str) -> SmsResult<Vec<EventContact>> {
        if self.failing.contains(event_name) {
            return Err(SmsError::Lookup(format!("participants of {} unavailable", event_name)));
        }
        Ok(self.participants.get(event_name).cloned().unwrap_or_default())
    }
}

/// Collects published events
#[derive(Default)]
pub struct InMemoryEventPublisher {
    events: RwLock<Vec<DomainEvent>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<DomainEvent> {
        self.events.read().clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, events: Vec<DomainEvent>) -> SmsResult<()> {
        self.events.write().extend(events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_gateway_records_and_spends_credits() {
        let gateway = InMemoryGateway::new(1.0);
        let first = gateway.send("hi", "+33612345678", Some("ACME")).await.unwrap();
        assert!(first.success);
        assert_eq!(first.sender_used.as_deref(), Some("ACME"));

        let second = gateway.send("hi", "+33612345678", None).await.unwrap();
        assert!(!second.success);
        assert_eq!(gateway.sent().len(), 1);
        assert_eq!(gateway.balance().await.unwrap().credits, Some(0.0));
    }

    #[tokio::test]
    async fn test_gateway_refusal_and_offline() {
        let gateway = InMemoryGateway::default();
        gateway.refuse("+33600000000");
        assert!(!gateway.send("x", "+33600000000", None).await.unwrap().success);

        let offline = InMemoryGateway::offline();
        assert!(matches!(offline.test_connection().await, Err(SmsError::Gateway(_))));
    }

    #[tokio::test]
    async fn test_sender_directory() {
        let directory = InMemorySenderDirectory::new(["ACME"]).rejecting("SMS");
        assert!(directory.create_sender("ERP", "").await.unwrap().success);
        assert!(!directory.create_sender("SMS", "").await.unwrap().success);
        assert_eq!(directory.list_senders().await.unwrap(), vec!["ACME", "ERP"]);
    }

    #[tokio::test]
    async fn test_static_lookups() {
        let rates = StaticRateLookup::new().with_rate("SKU-1", dec!(12.5)).failing_for("SKU-X");
        assert_eq!(rates.valuation_rate("SKU-1").await.unwrap(), Some(dec!(12.5)));
        assert_eq!(rates.valuation_rate("SKU-2").await.unwrap(), None);
        assert!(rates.valuation_rate("SKU-X").await.is_err());

        let customers = StaticCustomerLookup::new().with_mobile("C1", "0612345678");
        assert_eq!(customers.mobile("C1").await.unwrap().as_deref(), Some("0612345678"));
        assert_eq!(customers.mobile("C2").await.unwrap(), None);
    }
}
