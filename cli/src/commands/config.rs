//! Config commands

use rust_decimal::Decimal;

use crate::config::Config;
use crate::ConfigCommands;

const KEYS: &[&str] = &[
    "api_url",
    "api_key",
    "default_format",
    "default_sender",
    "sms.default_country_code",
    "sms.per_message_cost",
    "sms.segment_threshold",
    "sms.preview_limit",
    "sms.currency",
    "sms.default_template",
];

fn mask(key: &str) -> String {
    format!("{}****", key.chars().take(8).collect::<String>())
}

fn get(config: &Config, key: &str) -> Result<Option<String>, String> {
    let value = match key {
        "api_url" => config.api_url.clone(),
        "api_key" => config.api_key.as_deref().map(mask),
        "default_format" => config.default_format.clone(),
        "default_sender" => config.default_sender.clone(),
        "sms.default_country_code" => Some(config.sms.default_country_code.clone()),
        "sms.per_message_cost" => Some(config.sms.per_message_cost.to_string()),
        "sms.segment_threshold" => Some(config.sms.segment_threshold.to_string()),
        "sms.preview_limit" => Some(config.sms.preview_limit.to_string()),
        "sms.currency" => Some(config.sms.currency.clone()),
        "sms.default_template" => Some(config.sms.default_template.clone()),
        _ => return Err(format!("Unknown config key: {}", key)),
    };
    Ok(value)
}

fn set(config: &mut Config, key: &str, value: String) -> Result<(), String> {
    let parse_err = |e: &dyn std::fmt::Display| format!("invalid value for {}: {}", key, e);
    match key {
        "api_url" => config.api_url = Some(value),
        "api_key" => config.api_key = Some(value),
        "default_format" => config.default_format = Some(value),
        "default_sender" => config.default_sender = Some(value),
        "sms.default_country_code" => config.sms.default_country_code = value,
        "sms.per_message_cost" => {
            config.sms.per_message_cost = value.parse::<Decimal>().map_err(|e| parse_err(&e))?
        }
        "sms.segment_threshold" => config.sms.segment_threshold = value.parse().map_err(|e| parse_err(&e))?,
        "sms.preview_limit" => config.sms.preview_limit = value.parse().map_err(|e| parse_err(&e))?,
        "sms.currency" => config.sms.currency = value,
        "sms.default_template" => config.sms.default_template = value,
        _ => return Err(format!("Unknown config key: {}", key)),
    }
    config.sms.validate().map_err(|e| e.to_string())
}

pub fn handle(action: ConfigCommands, profile: Option<&str>) -> Result<(), String> {
    match action {
        ConfigCommands::Init => {
            let path = Config::default().save(profile)?;
            println!("Configuration initialized at {}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(profile)?;
            set(&mut config, &key, value)?;
            config.save(profile)?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load(profile)?;
            let value = get(&config, &key)?;
            println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
        }
        ConfigCommands::List => {
            let config = Config::load(profile)?;
            for key in KEYS {
                let value = get(&config, key)?;
                println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
            }
        }
    }
    Ok(())
}
