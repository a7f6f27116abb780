//! Phone commands

use serde::Serialize;
use sms_core::{normalize, PhoneNumber, SmsConfig};

use crate::output::{self, OutputFormat};
use crate::PhoneCommands;

#[derive(Debug, Serialize)]
struct NormalizedNumber {
    input: String,
    normalized: String,
}

fn normalize_all(numbers: &[String], country_code: &str) -> Vec<NormalizedNumber> {
    numbers
        .iter()
        .map(|raw| NormalizedNumber { input: raw.clone(), normalized: normalize(raw, country_code) })
        .collect()
}

pub fn handle(action: PhoneCommands, config: &SmsConfig, format: OutputFormat) -> Result<(), String> {
    match action {
        PhoneCommands::Normalize { numbers } => {
            if numbers.is_empty() {
                return Err("no number given".into());
            }
            let results = normalize_all(&numbers, &config.default_country_code);
            let rows = results.iter().map(|n| vec![n.input.clone(), n.normalized.clone()]).collect();
            format.print(&results, &["Input", "Normalized"], rows)
        }
        PhoneCommands::Check { number } => {
            let phone = PhoneNumber::parse_strict(&number, &config.default_country_code, config.strict_phone_digits)
                .map_err(|e| e.to_string())?;
            let result = NormalizedNumber { input: number, normalized: phone.into_string() };
            let rows = output::key_value(vec![
                ("Input", result.input.clone()),
                ("Normalized", result.normalized.clone()),
                ("Valid", output::yes_no(true)),
            ]);
            format.print(&result, &[], rows)
        }
    }
}
