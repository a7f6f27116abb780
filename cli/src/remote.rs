//! Backend adapters
//!
//! Implements the core ports over the backend's whitelisted RPC methods.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use sms_core::ports::outbound::EventPublisher;
use sms_core::{
    CustomerLookup, DomainEvent, GatewayResponse, RateLookup, SenderDirectory, SmsError, SmsGateway, SmsResult,
};

use crate::commands::ApiClient;

const SETTINGS_RPC: &str = "ovh_sms_integration.ovh_sms_integration.doctype.ovh_sms_settings.ovh_sms_settings";
const CAMPAIGN_RPC: &str =
    "ovh_sms_integration.ovh_sms_integration.doctype.sms_pricing_campaign.sms_pricing_campaign";
const SEND_RPC: &str = "ovh_sms_integration.utils.sms_utils.send_manual_sms";

fn settings_method(name: &str) -> String {
    format!("{}.{}", SETTINGS_RPC, name)
}

fn campaign_method(name: &str) -> String {
    format!("{}.{}", CAMPAIGN_RPC, name)
}

#[derive(Debug, Deserialize)]
struct RateReply {
    success: bool,
    #[serde(default)]
    rate: Option<Decimal>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RateReply {
    /// A zero or missing rate means no valuation is known
    fn into_rate(self) -> SmsResult<Option<Decimal>> {
        if !self.success {
            return Err(SmsError::Lookup(self.message.unwrap_or_else(|| "rate lookup refused".into())));
        }
        Ok(self.rate.filter(|r| !r.is_zero()))
    }
}

/// Body for one message; the backend picks a sender when none is given
fn send_body(message: &str, to: &str, sender: Option<&str>) -> Value {
    let mut body = json!({ "message": message, "receivers": [to] });
    if let Some(sender) = sender {
        body["sender"] = json!(sender);
    }
    body
}

/// One entry of the per-receiver list returned by the send RPC
#[derive(Debug, Deserialize)]
struct ReceiverResult {
    receiver: String,
    success: bool,
    #[serde(default)]
    result: Option<Value>,
}

impl ReceiverResult {
    /// The nested gateway result decides; `success` alone only says one came back
    fn into_response(self) -> GatewayResponse {
        let Some(result) = self.result.filter(|r| !r.is_null()) else {
            return GatewayResponse::failure(format!("sending to {} failed", self.receiver));
        };
        let text = |key: &str| match result.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let success = result.get("success").and_then(Value::as_bool).unwrap_or(self.success);
        GatewayResponse {
            success,
            message: text("message").unwrap_or_else(|| format!("message sent to {}", self.receiver)),
            sender_used: text("sender_used"),
            sms_id: text("sms_id"),
            ..Default::default()
        }
    }
}

fn first_result(results: Vec<ReceiverResult>) -> SmsResult<GatewayResponse> {
    results
        .into_iter()
        .next()
        .map(ReceiverResult::into_response)
        .ok_or_else(|| SmsError::Gateway("no result returned for receiver".into()))
}

#[derive(Debug, Deserialize)]
struct MobileReply {
    success: bool,
    #[serde(default)]
    mobile: Option<String>,
}

impl MobileReply {
    fn into_mobile(self) -> Option<String> {
        if !self.success {
            return None;
        }
        self.mobile.filter(|m| !m.trim().is_empty())
    }
}

#[async_trait]
impl SmsGateway for ApiClient {
    async fn test_connection(&self) -> SmsResult<GatewayResponse> {
        self.call(&settings_method("test_ovh_connection"), &json!({}))
            .await
            .map_err(SmsError::Gateway)
    }

    async fn balance(&self) -> SmsResult<GatewayResponse> {
        self.call(&settings_method("get_account_balance"), &json!({}))
            .await
            .map_err(SmsError::Gateway)
    }

    async fn send(&self, message: &str, to: &str, sender: Option<&str>) -> SmsResult<GatewayResponse> {
        let results: Vec<ReceiverResult> = self
            .call(SEND_RPC, &send_body(message, to, sender))
            .await
            .map_err(SmsError::Gateway)?;
        first_result(results)
    }
}

#[async_trait]
impl SenderDirectory for ApiClient {
    async fn list_senders(&self) -> SmsResult<Vec<String>> {
        let response: GatewayResponse = self
            .call(&settings_method("get_available_senders"), &json!({}))
            .await
            .map_err(SmsError::Gateway)?;
        if !response.success {
            return Err(SmsError::Gateway(response.message));
        }
        Ok(response.senders.unwrap_or_default())
    }

    async fn create_sender(&self, name: &str, description: &str) -> SmsResult<GatewayResponse> {
        self.call(
            &settings_method("create_new_sender"),
            &json!({ "sender_name": name, "description": description }),
        )
        .await
        .map_err(SmsError::Gateway)
    }
}

#[async_trait]
impl RateLookup for ApiClient {
    async fn valuation_rate(&self, item_code: &str) -> SmsResult<Option<Decimal>> {
        let reply: RateReply = self
            .call(&campaign_method("get_item_valuation_rate"), &json!({ "item_code": item_code }))
            .await
            .map_err(SmsError::Lookup)?;
        if let Some(source) = &reply.source {
            tracing::debug!(%item_code, %source, "Valuation rate source");
        }
        reply.into_rate()
    }
}

#[async_trait]
impl CustomerLookup for ApiClient {
    async fn mobile(&self, customer: &str) -> SmsResult<Option<String>> {
        let reply: MobileReply = self
            .call(&campaign_method("get_customer_mobile"), &json!({ "customer": customer }))
            .await
            .map_err(SmsError::Lookup)?;
        Ok(reply.into_mobile())
    }
}

/// Publishes campaign events to the log
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, events: Vec<DomainEvent>) -> SmsResult<()> {
        for event in events {
            tracing::info!(event = ?event, "Campaign event");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_method_paths() {
        assert!(settings_method("get_account_balance").ends_with("ovh_sms_settings.get_account_balance"));
        assert!(campaign_method("get_customer_mobile").ends_with("sms_pricing_campaign.get_customer_mobile"));
    }

    #[test]
    fn test_send_body_carries_sender() {
        let body = send_body("Bonjour", "+33612345678", Some("ACME"));
        assert_eq!(body, json!({"message": "Bonjour", "receivers": ["+33612345678"], "sender": "ACME"}));

        let body = send_body("Bonjour", "+33612345678", None);
        assert!(body.get("sender").is_none());
        assert!(SEND_RPC.ends_with("utils.sms_utils.send_manual_sms"));
    }

    #[test]
    fn test_receiver_result_uses_nested_outcome() {
        let results: Vec<ReceiverResult> = serde_json::from_str(
            r#"[{"receiver": "+33612345678", "success": true,
                 "result": {"success": true, "message": "sent", "sender_used": "ACME", "sms_id": 4242}}]"#,
        )
        .unwrap();
        let response = first_result(results).unwrap();
        assert!(response.success);
        assert_eq!(response.sender_used.as_deref(), Some("ACME"));
        assert_eq!(response.sms_id.as_deref(), Some("4242"));

        // the backend flags any returned result as success, even a refusal
        let refused: Vec<ReceiverResult> = serde_json::from_str(
            r#"[{"receiver": "+33612345678", "success": true,
                 "result": {"success": false, "message": "API Error: invalid sender"}}]"#,
        )
        .unwrap();
        let response = first_result(refused).unwrap();
        assert!(!response.success);
        assert_eq!(response.message, "API Error: invalid sender");
    }

    #[test]
    fn test_receiver_without_result_failed() {
        let results: Vec<ReceiverResult> =
            serde_json::from_str(r#"[{"receiver": "+33612345678", "success": false, "result": null}]"#).unwrap();
        assert!(!first_result(results).unwrap().success);
        assert!(matches!(first_result(vec![]), Err(SmsError::Gateway(_))));
    }

    #[test]
    fn test_rate_reply() {
        let reply: RateReply = serde_json::from_str(r#"{"success": true, "rate": 12.5, "source": "Bin"}"#).unwrap();
        assert_eq!(reply.into_rate().unwrap(), Some(dec!(12.5)));

        let zero: RateReply = serde_json::from_str(r#"{"success": true, "rate": 0}"#).unwrap();
        assert_eq!(zero.into_rate().unwrap(), None);

        let refused: RateReply = serde_json::from_str(r#"{"success": false, "message": "no item"}"#).unwrap();
        assert!(matches!(refused.into_rate(), Err(SmsError::Lookup(m)) if m == "no item"));
    }

    #[test]
    fn test_mobile_reply() {
        let reply: MobileReply = serde_json::from_str(r#"{"success": true, "mobile": "0612345678"}"#).unwrap();
        assert_eq!(reply.into_mobile().as_deref(), Some("0612345678"));

        let blank: MobileReply = serde_json::from_str(r#"{"success": true, "mobile": " "}"#).unwrap();
        assert_eq!(blank.into_mobile(), None);

        let refused: MobileReply = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(refused.into_mobile(), None);
    }
}
