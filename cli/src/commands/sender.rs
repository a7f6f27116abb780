//! Sender commands

use sms_core::{validate_sender, SmsConfig};

use crate::output::{self, OutputFormat};
use crate::SenderCommands;

pub fn handle(action: SenderCommands, config: &SmsConfig, format: OutputFormat) -> Result<(), String> {
    match action {
        SenderCommands::Validate { name } => {
            let verdict = validate_sender(&name, config.sender);
            let rows = output::key_value(vec![
                ("Sender", name.clone()),
                ("Valid", output::yes_no(verdict.valid)),
                ("Severity", output::severity(verdict.severity)),
                ("Message", verdict.message.clone()),
            ]);
            format.print(&verdict, &[], rows)?;

            if verdict.valid {
                Ok(())
            } else {
                Err(format!("sender '{}' is not usable", name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sender_is_an_error() {
        let config = SmsConfig::default();
        let ok = handle(SenderCommands::Validate { name: "ACME".into() }, &config, OutputFormat::Json);
        assert!(ok.is_ok());
        // too short is only a warning
        assert!(handle(SenderCommands::Validate { name: "AB".into() }, &config, OutputFormat::Json).is_ok());

        let bad = handle(SenderCommands::Validate { name: "ACME-SHOP".into() }, &config, OutputFormat::Json);
        assert!(bad.is_err());
    }
}
