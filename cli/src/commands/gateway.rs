//! Gateway commands

use std::sync::Arc;

use sms_core::domain::value_objects::{PhoneNumber, SenderName};
use sms_core::{GatewayResponse, SenderDirectory, SenderSelector, SmsGateway};

use super::ApiClient;
use crate::config::Config;
use crate::output::{self, OutputFormat};
use crate::GatewayCommands;

fn response_rows(response: &GatewayResponse) -> Vec<Vec<String>> {
    let mut pairs = vec![
        ("Success", output::yes_no(response.success)),
        ("Message", response.message.clone()),
    ];
    if let Some(credits) = response.credits {
        pairs.push(("Credits", format!("{:.2}", credits)));
    }
    if let Some(status) = &response.status {
        pairs.push(("Status", status.clone()));
    }
    if let Some(service) = &response.service_name {
        pairs.push(("Service", service.clone()));
    }
    if let Some(sender) = &response.sender_used {
        pairs.push(("Sender", sender.clone()));
    }
    if let Some(id) = &response.sms_id {
        pairs.push(("SMS id", id.clone()));
    }
    output::key_value(pairs)
}

/// Print a backend response and fail when it reports a refusal
fn report(response: GatewayResponse, format: OutputFormat) -> Result<(), String> {
    format.print(&response, &[], response_rows(&response))?;
    if response.success {
        Ok(())
    } else {
        Err(response.message)
    }
}

fn default_test_message() -> String {
    format!("Test SMS - {}", chrono::Local::now().format("%H:%M"))
}

pub async fn handle(
    action: GatewayCommands,
    client: ApiClient,
    config: &Config,
    format: OutputFormat,
) -> Result<(), String> {
    let client = Arc::new(client);

    match action {
        GatewayCommands::Test => {
            let response = client.test_connection().await.map_err(|e| e.to_string())?;
            report(response, format)
        }
        GatewayCommands::Balance => {
            let response = client.balance().await.map_err(|e| e.to_string())?;
            report(response, format)
        }
        GatewayCommands::Senders => {
            let senders = client.list_senders().await.map_err(|e| e.to_string())?;
            let rows = senders.iter().map(|s| vec![s.clone()]).collect();
            format.print(&senders, &["Sender"], rows)
        }
        GatewayCommands::CreateSender { name, description } => {
            let sender = SenderName::parse(name, config.sms.sender).map_err(|e| e.to_string())?;
            let response = client
                .create_sender(sender.as_str(), &description)
                .await
                .map_err(|e| e.to_string())?;
            report(response.with_sender(sender.as_str()), format)
        }
        GatewayCommands::BestSender => {
            let selector = SenderSelector::new(
                client.clone(),
                config.default_sender.clone(),
                config.sms.fallback_senders.clone(),
                config.sms.sender,
            );
            let sender = selector.best_sender().await.map_err(|e| e.to_string())?;
            format.print(&sender, &[], output::key_value(vec![("Sender", sender.clone())]))
        }
        GatewayCommands::Send { to, message, sender } => {
            let phone = PhoneNumber::parse_strict(&to, &config.sms.default_country_code, config.sms.strict_phone_digits)
                .map_err(|e| e.to_string())?;
            let message = message.unwrap_or_else(default_test_message);
            let response = client
                .send(&message, phone.as_str(), sender.as_deref())
                .await
                .map_err(|e| e.to_string())?;
            report(response.with_content(message), format)
        }
    }
}
