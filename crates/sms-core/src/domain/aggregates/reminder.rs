//! Event reminders
//!
//! Settings and pure rules deciding which calendar events get an SMS reminder,
//! when, and with which message.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::domain::services::template::{placeholders, render, TemplateContext, REMINDER_VARIABLES};
use crate::error::{SmsError, SmsResult};

/// Half-width of the window around each reminder time, in minutes
pub const WINDOW_MARGIN_MINUTES: i64 = 30;

/// Longest accepted lead time: one year
pub const MAX_REMINDER_HOURS: f64 = 8760.0;

/// Who a reminder is addressed to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    Customer,
    Employee,
}

/// Event reminder settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    pub enabled: bool,
    /// Comma-separated event types to watch
    pub event_type_filter: String,
    pub reminder_hours_before: f64,
    pub enable_multiple_reminders: bool,
    /// Comma-separated hours, e.g. "24,2,0.5"
    pub reminder_times: Option<String>,
    pub customer_template: Option<String>,
    pub employee_template: Option<String>,
    pub default_template: Option<String>,
    /// Older single-template field, used last
    pub reminder_message_template: Option<String>,
    pub business_hours_only: bool,
    pub business_start_time: Option<NaiveTime>,
    pub business_end_time: Option<NaiveTime>,
    pub exclude_weekends: bool,
    /// Minutes; zero disables the check
    pub minimum_event_duration: u32,
    pub skip_past_events: bool,
    pub skip_all_day_events: bool,
    pub send_to_customer_only: bool,
    pub send_to_employee: bool,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            event_type_filter: String::new(),
            reminder_hours_before: 24.0,
            enable_multiple_reminders: false,
            reminder_times: None,
            customer_template: None,
            employee_template: None,
            default_template: None,
            reminder_message_template: None,
            business_hours_only: false,
            business_start_time: None,
            business_end_time: None,
            exclude_weekends: false,
            minimum_event_duration: 0,
            skip_past_events: true,
            skip_all_day_events: false,
            send_to_customer_only: false,
            send_to_employee: false,
        }
    }
}

impl ReminderSettings {
    /// Check the settings; returns warnings about unknown template placeholders.
    /// Disabled settings are not checked.
    pub fn validate(&self) -> SmsResult<Vec<String>> {
        if !self.enabled {
            return Ok(vec![]);
        }

        if self.event_type_filters().is_empty() {
            return Err(SmsError::InvalidReminder("event type filter is required".into()));
        }
        check_hours(self.reminder_hours_before)?;
        if self.enable_multiple_reminders {
            let raw = self
                .reminder_times
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| SmsError::InvalidReminder("reminder times required for multiple reminders".into()))?;
            parse_reminder_times(raw)?;
        }

        let templates = self.templates();
        if templates.is_empty() {
            return Err(SmsError::InvalidReminder("at least one message template is required".into()));
        }

        let mut warnings = Vec::new();
        for (label, template) in templates {
            for name in placeholders(template) {
                if !REMINDER_VARIABLES.contains(&name.as_str()) {
                    warnings.push(format!("{} template: unknown variable '{}'", label, name));
                }
            }
        }
        Ok(warnings)
    }

    /// Hours before the event at which reminders go out
    pub fn reminder_times(&self) -> Vec<f64> {
        if self.enable_multiple_reminders {
            if let Some(raw) = self.reminder_times.as_deref().filter(|t| !t.trim().is_empty()) {
                match parse_reminder_times(raw) {
                    Ok(times) => return times,
                    Err(e) => tracing::warn!(error = %e, "Falling back to single reminder time"),
                }
            }
        }
        vec![self.reminder_hours_before]
    }

    /// Template for a recipient: specific, then default, then legacy
    pub fn template_for(&self, kind: RecipientKind) -> &str {
        let specific = match kind {
            RecipientKind::Customer => &self.customer_template,
            RecipientKind::Employee => &self.employee_template,
        };
        non_blank(specific)
            .or_else(|| non_blank(&self.default_template))
            .or_else(|| self.reminder_message_template.as_deref())
            .unwrap_or_default()
    }

    /// Recipient kinds that receive reminders
    pub fn audiences(&self) -> Vec<RecipientKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.send_to_customer_only || !self.send_to_employee {
            kinds.push(RecipientKind::Customer);
        }
        if self.send_to_employee {
            kinds.push(RecipientKind::Employee);
        }
        kinds
    }

    /// Business-hours and weekend gates
    pub fn should_send_at(&self, now: NaiveDateTime) -> bool {
        if self.business_hours_only {
            let time = now.time();
            let before_open = self.business_start_time.map(|start| time < start).unwrap_or(false);
            let after_close = self.business_end_time.map(|end| time > end).unwrap_or(false);
            if before_open || after_close {
                return false;
            }
        }

        if self.exclude_weekends && now.weekday().number_from_monday() >= 6 {
            return false;
        }

        true
    }

    /// One window per reminder time: `now + h` give or take 30 minutes.
    /// Times outside `(0, MAX_REMINDER_HOURS]` get no window.
    pub fn reminder_windows(&self, now: NaiveDateTime) -> Vec<ReminderWindow> {
        self.reminder_times()
            .into_iter()
            .filter_map(|hours| {
                let window = reminder_window(now, hours);
                if window.is_none() {
                    tracing::warn!(hours, "Skipping reminder time out of range");
                }
                window
            })
            .collect()
    }

    /// Trimmed, non-empty filter terms
    pub fn event_type_filters(&self) -> Vec<&str> {
        self.event_type_filter
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Render the reminder a recipient would receive
    pub fn format_message(&self, kind: RecipientKind, event: &CalendarEvent, recipient_name: &str) -> String {
        let details = EventDetails::parse(&event.description);
        let (customer, employee) = match kind {
            RecipientKind::Customer => (Some(recipient_name), None),
            RecipientKind::Employee => (None, Some(recipient_name)),
        };
        render(self.template_for(kind), &reminder_context(event, &details, customer, employee))
    }

    fn templates(&self) -> Vec<(&'static str, &str)> {
        [
            ("customer", &self.customer_template),
            ("employee", &self.employee_template),
            ("default", &self.default_template),
            ("legacy", &self.reminder_message_template),
        ]
        .into_iter()
        .filter_map(|(label, template)| non_blank(template).map(|t| (label, t)))
        .collect()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn check_hours(hours: f64) -> SmsResult<()> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(SmsError::InvalidReminder("every reminder time must be positive".into()));
    }
    if hours > MAX_REMINDER_HOURS {
        return Err(SmsError::InvalidReminder(format!(
            "reminder time {}h exceeds {}h",
            hours, MAX_REMINDER_HOURS
        )));
    }
    Ok(())
}

fn reminder_window(now: NaiveDateTime, hours: f64) -> Option<ReminderWindow> {
    check_hours(hours).ok()?;
    let margin = Duration::try_minutes(WINDOW_MARGIN_MINUTES)?;
    let centre = now.checked_add_signed(Duration::try_minutes((hours * 60.0).round() as i64)?)?;
    Some(ReminderWindow {
        hours_before: hours,
        start: centre.checked_sub_signed(margin)?,
        end: centre.checked_add_signed(margin)?,
    })
}

/// Parse "24,2,0.5"; every entry must be a positive number of at most
/// `MAX_REMINDER_HOURS`
pub fn parse_reminder_times(raw: &str) -> SmsResult<Vec<f64>> {
    let mut times = Vec::new();
    for part in raw.split(',') {
        let hours: f64 = part.trim().parse().map_err(|_| {
            SmsError::InvalidReminder(format!("invalid reminder times '{}' (e.g. 24,2,0.5)", raw))
        })?;
        check_hours(hours)?;
        times.push(hours);
    }
    Ok(times)
}

/// Start-time range in which an event is due for a reminder
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReminderWindow {
    pub hours_before: f64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ReminderWindow {
    /// Inclusive on both ends
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at <= self.end
    }
}

// =============================================================================
// Calendar events
// =============================================================================

/// Calendar event as read from the scheduling system
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub starts_on: NaiveDateTime,
    #[serde(default)]
    pub ends_on: Option<NaiveDateTime>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub location: Option<String>,
}

impl CalendarEvent {
    /// Whole minutes between start and end
    pub fn duration_minutes(&self) -> Option<i64> {
        self.ends_on.map(|end| (end - self.starts_on).num_minutes())
    }
}

/// Event participant reachable by SMS
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContact {
    pub name: String,
    pub mobile: Option<String>,
    pub kind: RecipientKind,
}

/// Fields carried in a structured event description
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub client: Option<String>,
    pub reference: Option<String>,
    pub event_type: Option<String>,
    pub article: Option<String>,
    pub tel_client: Option<String>,
    pub email_client: Option<String>,
    pub appareil: Option<String>,
    pub camion_requis: Option<String>,
}

/// Description labels in field order
const DETAIL_LABELS: [&str; 8] = [
    "Client",
    "Référence",
    "Type",
    "Article",
    "Tél client",
    "Email client",
    "Appareil",
    "Camion requis",
];

struct DetailPatterns {
    markdown: Vec<Regex>,
    plain: Vec<Regex>,
}

fn detail_patterns() -> &'static DetailPatterns {
    static PATTERNS: OnceLock<DetailPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| DetailPatterns {
        markdown: DETAIL_LABELS
            .iter()
            .map(|label| {
                Regex::new(&format!(r"\*\*{}:\*\*\s*([^\n\r*]+)", regex::escape(label)))
                    .expect("markdown label pattern is valid")
            })
            .collect(),
        plain: DETAIL_LABELS
            .iter()
            .map(|label| {
                Regex::new(&format!(r"{}:\s*([^\n\r]+)", regex::escape(label)))
                    .expect("plain label pattern is valid")
            })
            .collect(),
    })
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|value| !value.is_empty())
}

impl EventDetails {
    /// Parse `**Label:** value` lines, or plain `Label: value` when no
    /// markdown label is present at all
    pub fn parse(description: &str) -> Self {
        let patterns = detail_patterns();
        let mut values: Vec<Option<String>> =
            patterns.markdown.iter().map(|p| capture(p, description)).collect();

        if values.iter().all(Option::is_none) {
            values = patterns.plain.iter().map(|p| capture(p, description)).collect();
        }

        let mut values = values.into_iter();
        let mut next = || values.next().flatten();
        Self {
            client: next(),
            reference: next(),
            event_type: next(),
            article: next(),
            tel_client: next(),
            email_client: next(),
            appareil: next(),
            camion_requis: next(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Event type named in a description, markdown form first
pub fn event_type_from_description(description: &str) -> Option<String> {
    let patterns = detail_patterns();
    let index = 2;
    capture(&patterns.markdown[index], description).or_else(|| capture(&patterns.plain[index], description))
}

/// Event type used for filtering: from the description, else the first
/// filter term found in the subject
pub fn resolve_event_type(event: &CalendarEvent, filters: &[&str]) -> Option<String> {
    event_type_from_description(&event.description).or_else(|| {
        let subject = event.subject.to_lowercase();
        filters
            .iter()
            .find(|term| subject.contains(&term.to_lowercase()))
            .map(|term| term.to_string())
    })
}

/// Case-insensitive containment of any filter term in the type
pub fn matches_event_type(event_type: &str, filters: &[&str]) -> bool {
    let event_type = event_type.to_lowercase();
    filters.iter().any(|term| event_type.contains(&term.to_lowercase()))
}

/// Whether an event should get a reminder at `now`
pub fn event_is_eligible(event: &CalendarEvent, settings: &ReminderSettings, now: NaiveDateTime) -> bool {
    if !settings.enabled {
        return false;
    }

    let in_window = settings
        .reminder_windows(now)
        .iter()
        .any(|window| window.contains(event.starts_on));
    if !in_window {
        return false;
    }

    if settings.skip_past_events && event.starts_on <= now {
        return false;
    }
    if settings.skip_all_day_events && event.all_day {
        return false;
    }

    let filters = settings.event_type_filters();
    let typed = resolve_event_type(event, &filters)
        .map(|event_type| matches_event_type(&event_type, &filters))
        .unwrap_or(false);
    if !typed {
        return false;
    }

    if settings.minimum_event_duration > 0 {
        return event
            .duration_minutes()
            .map(|minutes| minutes >= i64::from(settings.minimum_event_duration))
            .unwrap_or(false);
    }

    true
}

/// Substitution values for a reminder message
pub fn reminder_context(
    event: &CalendarEvent,
    details: &EventDetails,
    customer_name: Option<&str>,
    employee_name: Option<&str>,
) -> TemplateContext {
    let mut context = TemplateContext::new();
    let mut put = |key: &str, value: String| {
        context.insert(key.to_string(), value);
    };

    put("subject", event.subject.clone());
    put("description", event.description.clone());
    put("event_name", event.name.clone());
    put("start_date", event.starts_on.format("%d/%m/%Y").to_string());
    put("start_time", event.starts_on.format("%H:%M").to_string());
    put("location", event.location.clone().unwrap_or_default());
    put("customer_name", customer_name.unwrap_or_default().to_string());
    put("employee_name", employee_name.unwrap_or_default().to_string());
    put(
        "duration",
        event.duration_minutes().map(|m| m.to_string()).unwrap_or_default(),
    );

    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    put("client", field(&details.client));
    put("reference", field(&details.reference));
    put("type", field(&details.event_type));
    put("article", field(&details.article));
    put("tel_client", field(&details.tel_client));
    put("email_client", field(&details.email_client));
    put("appareil", field(&details.appareil));
    put("camion_requis", field(&details.camion_requis));
    context
}

// =============================================================================
// Statistics
// =============================================================================

/// Running reminder counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderStats {
    pub total_sent: u64,
    pub failed: u64,
    pub sent_today: u64,
    pub last_check: Option<NaiveDateTime>,
    pub last_sent: Option<NaiveDateTime>,
}

impl ReminderStats {
    /// Add one run's outcome; the daily counter resets on a new day
    pub fn record(&mut self, sent: u64, failed: u64, now: NaiveDateTime) {
        let last_day: Option<NaiveDate> = self.last_check.map(|at| at.date());

        self.total_sent += sent;
        self.failed += failed;
        self.sent_today = if last_day == Some(now.date()) {
            self.sent_today + sent
        } else {
            sent
        };
        self.last_check = Some(now);
        if sent > 0 {
            self.last_sent = Some(now);
        }
    }

    /// Next scheduled check, one hour after the last
    pub fn next_check(&self) -> Option<NaiveDateTime> {
        self.last_check.map(|at| at + Duration::hours(1))
    }
}
