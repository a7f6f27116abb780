//! CLI Configuration

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sms_core::SmsConfig;
use std::fs;
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub default_format: Option<String>,
    /// Sender tried first when sending
    pub default_sender: Option<String>,
    /// Rules and constants for the core
    pub sms: SmsConfig,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self, String> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| e.to_string())?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf, String> {
        let path = Self::config_path(profile)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(&path, content).map_err(|e| e.to_string())?;
        Ok(path)
    }

    /// Configured output format, table when unset or unknown
    pub fn output_format(&self) -> OutputFormat {
        self.default_format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
            .unwrap_or(OutputFormat::Table)
    }

    fn config_path(profile: Option<&str>) -> Result<PathBuf, String> {
        let home = dirs::home_dir().ok_or("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".smsctl").join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse(
            r#"
api_url = "https://erp.example.com"
default_format = "json"

[sms]
default_country_code = "+32"
per_message_cost = 0.08
"#,
        )
        .unwrap();
        assert_eq!(config.api_url.as_deref(), Some("https://erp.example.com"));
        assert!(matches!(config.output_format(), OutputFormat::Json));
        assert_eq!(config.sms.default_country_code, "+32");
        assert_eq!(config.sms.per_message_cost, dec!(0.08));
        assert_eq!(config.sms.segment_threshold, 160);
    }

    #[test]
    fn test_unknown_format_falls_back_to_table() {
        let config = Config { default_format: Some("xml".into()), ..Default::default() };
        assert!(matches!(config.output_format(), OutputFormat::Table));
    }

    #[test]
    fn test_serializes_back_to_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(text.contains("[sms]"));
        assert_eq!(Config::parse(&text).unwrap().sms, SmsConfig::default());
    }
}
