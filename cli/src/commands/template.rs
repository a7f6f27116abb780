//! Template commands

use serde::Serialize;
use sms_core::domain::services::{
    segment_count, TemplateContext, CAMPAIGN_REQUIRED_VARIABLES, CAMPAIGN_VARIABLES, REMINDER_VARIABLES,
};
use sms_core::{render, validate_template, SmsConfig};

use crate::output::{self, OutputFormat};
use crate::{TemplateCommands, TemplateKind};

#[derive(Debug, Serialize)]
struct Rendered {
    message: String,
    length: usize,
    segments: usize,
}

/// Parse `key=value` pairs; the value may itself contain `=`
fn parse_vars(vars: &[String]) -> Result<TemplateContext, String> {
    vars.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", pair))
        })
        .collect()
}

pub fn handle(action: TemplateCommands, config: &SmsConfig, format: OutputFormat) -> Result<(), String> {
    match action {
        TemplateCommands::Render { template, vars } => {
            let context = parse_vars(&vars)?;
            let message = render(&template, &context);
            let length = message.chars().count();
            let result = Rendered {
                segments: segment_count(length, config.segment_threshold),
                length,
                message,
            };
            let rows = output::key_value(vec![
                ("Message", result.message.clone()),
                ("Length", result.length.to_string()),
                ("Segments", result.segments.to_string()),
            ]);
            format.print(&result, &[], rows)
        }
        TemplateCommands::Check { template, kind } => {
            let (known, required) = match kind {
                TemplateKind::Campaign => (CAMPAIGN_VARIABLES, CAMPAIGN_REQUIRED_VARIABLES),
                TemplateKind::Reminder => (REMINDER_VARIABLES, &[][..]),
            };
            let report = validate_template(&template, known, required, config.segment_threshold);
            let rows = output::key_value(vec![
                ("Clean", output::yes_no(report.is_clean())),
                ("Missing required", report.missing_required.join(", ")),
                ("Unknown", report.unknown_placeholders.join(", ")),
                ("Length", report.length.to_string()),
                ("Segments", report.segments.to_string()),
            ]);
            format.print(&report, &[], rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vars() {
        let context = parse_vars(&["name=Ana".into(), "url=a=b".into()]).unwrap();
        assert_eq!(context["name"], "Ana");
        assert_eq!(context["url"], "a=b");
    }

    #[test]
    fn test_parse_vars_rejects_missing_separator() {
        assert!(parse_vars(&["name".into()]).is_err());
        assert!(parse_vars(&["=x".into()]).is_err());
    }

    #[test]
    fn test_check_is_a_report_not_an_error() {
        let action = TemplateCommands::Check { template: "{{nope}}".into(), kind: TemplateKind::Campaign };
        assert!(handle(action, &SmsConfig::default(), OutputFormat::Json).is_ok());
    }
}
