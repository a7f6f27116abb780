//! Reminder commands

use chrono::NaiveDateTime;
use serde::Serialize;
use sms_core::domain::aggregates::{EventDetails, RecipientKind, ReminderWindow};
use sms_core::ReminderSettings;

use super::load_file;
use crate::output::{self, OutputFormat};
use crate::ReminderCommands;

const AT_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Serialize)]
struct SettingsCheck {
    enabled: bool,
    reminder_times: Vec<f64>,
    audiences: Vec<RecipientKind>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct WindowReport {
    at: NaiveDateTime,
    sending_allowed: bool,
    windows: Vec<ReminderWindow>,
}

fn parse_at(at: Option<&str>) -> Result<NaiveDateTime, String> {
    match at {
        Some(raw) => NaiveDateTime::parse_from_str(raw.trim(), AT_FORMAT)
            .map_err(|e| format!("invalid --at '{}' ({}), expected YYYY-MM-DD HH:MM", raw, e)),
        None => Ok(chrono::Local::now().naive_local()),
    }
}

fn detail_rows(details: &EventDetails) -> Vec<Vec<String>> {
    output::key_value(vec![
        ("Client", output::or_dash(details.client.as_ref())),
        ("Reference", output::or_dash(details.reference.as_ref())),
        ("Type", output::or_dash(details.event_type.as_ref())),
        ("Article", output::or_dash(details.article.as_ref())),
        ("Customer phone", output::or_dash(details.tel_client.as_ref())),
        ("Customer email", output::or_dash(details.email_client.as_ref())),
        ("Appliance", output::or_dash(details.appareil.as_ref())),
        ("Truck required", output::or_dash(details.camion_requis.as_ref())),
    ])
}

pub fn handle(action: ReminderCommands, format: OutputFormat) -> Result<(), String> {
    match action {
        ReminderCommands::Check { file } => {
            let settings: ReminderSettings = load_file(&file)?;
            let warnings = settings.validate().map_err(|e| e.to_string())?;
            let check = SettingsCheck {
                enabled: settings.enabled,
                reminder_times: settings.reminder_times(),
                audiences: settings.audiences(),
                warnings,
            };

            let times: Vec<String> = check.reminder_times.iter().map(|h| format!("{}h", h)).collect();
            let audiences: Vec<String> = check.audiences.iter().map(|k| format!("{:?}", k).to_lowercase()).collect();
            let rows = output::key_value(vec![
                ("Enabled", output::yes_no(check.enabled)),
                ("Reminder times", times.join(", ")),
                ("Audiences", audiences.join(", ")),
                ("Warnings", check.warnings.join("; ")),
            ]);
            format.print(&check, &[], rows)
        }
        ReminderCommands::Windows { file, at } => {
            let settings: ReminderSettings = load_file(&file)?;
            let at = parse_at(at.as_deref())?;
            let report = WindowReport {
                at,
                sending_allowed: settings.should_send_at(at),
                windows: settings.reminder_windows(at),
            };

            if format.is_table() {
                println!("At {} sending allowed: {}", at.format(AT_FORMAT), output::yes_no(report.sending_allowed));
            }
            let rows = report
                .windows
                .iter()
                .map(|w| {
                    vec![
                        format!("{}h", w.hours_before),
                        w.start.format(AT_FORMAT).to_string(),
                        w.end.format(AT_FORMAT).to_string(),
                    ]
                })
                .collect();
            format.print(&report, &["Hours before", "Events from", "Events to"], rows)
        }
        ReminderCommands::Parse { description } => {
            // literal "\n" from a shell argument counts as a line break
            let details = EventDetails::parse(&description.replace("\\n", "\n"));
            if details.is_empty() {
                return Err("no structured field found in description".into());
            }
            format.print(&details, &[], detail_rows(&details))
        }
    }
}
