//! Event reminder dispatch

use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::sync::Arc;

use crate::application::dto::{ReminderDelivery, ReminderRunReport};
use crate::config::SmsConfig;
use crate::domain::aggregates::{
    event_is_eligible, CalendarEvent, RecipientKind, ReminderSettings, ReminderStats,
};
use crate::domain::value_objects::PhoneNumber;
use crate::error::{SmsError, SmsResult};
use crate::ports::outbound::{CalendarSource, GatewayResponse, SmsGateway};

/// Names used for test reminders
pub const TEST_CUSTOMER_NAME: &str = "Client Test";
pub const TEST_EMPLOYEE_NAME: &str = "Employé Test";

/// Sends reminders for upcoming calendar events
pub struct ReminderService {
    gateway: Arc<dyn SmsGateway>,
    calendar: Arc<dyn CalendarSource>,
    config: SmsConfig,
}

impl ReminderService {
    pub fn new(gateway: Arc<dyn SmsGateway>, calendar: Arc<dyn CalendarSource>, config: SmsConfig) -> Self {
        Self { gateway, calendar, config }
    }

    /// Events due for a reminder at `now`, each listed once
    pub async fn due_events(&self, settings: &ReminderSettings, now: NaiveDateTime) -> SmsResult<Vec<CalendarEvent>> {
        let mut seen = HashSet::new();
        let mut due = Vec::new();

        for window in settings.reminder_windows(now) {
            let events = self.calendar.events_starting_between(window.start, window.end).await?;
            for event in events {
                if seen.contains(&event.name) || !event_is_eligible(&event, settings, now) {
                    continue;
                }
                seen.insert(event.name.clone());
                due.push(event);
            }
        }

        Ok(due)
    }

    /// One reminder pass. Updates `stats` unless the run was skipped. An
    /// event whose participants cannot be loaded counts as one failure.
    pub async fn run(
        &self,
        settings: &ReminderSettings,
        stats: &mut ReminderStats,
        now: NaiveDateTime,
    ) -> SmsResult<ReminderRunReport> {
        let mut report = ReminderRunReport::default();
        if !settings.enabled {
            report.skipped = Some("reminders disabled".into());
            return Ok(report);
        }
        if !settings.should_send_at(now) {
            report.skipped = Some("outside sending hours".into());
            return Ok(report);
        }

        let events = self.due_events(settings, now).await?;
        report.events_checked = events.len();

        for event in &events {
            let participants = match self.calendar.participants(&event.name).await {
                Ok(participants) => participants,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(event = %event.name, error = %e, "Could not load participants");
                    continue;
                }
            };
            for kind in settings.audiences() {
                for contact in participants.iter().filter(|c| c.kind == kind) {
                    let Some(mobile) = contact.mobile.as_deref().filter(|m| !m.trim().is_empty()) else {
                        continue;
                    };
                    let message = settings.format_message(kind, event, &contact.name);
                    let delivery = self.deliver(event, &contact.name, kind, mobile, message).await;
                    if delivery.response.success {
                        report.sent += 1;
                        tracing::info!(event = %event.name, recipient = %contact.name, ?kind, "Reminder sent");
                    } else {
                        report.failed += 1;
                        tracing::warn!(event = %event.name, recipient = %contact.name, reason = %delivery.response.message, "Reminder failed");
                    }
                    report.deliveries.push(delivery);
                }
            }
        }

        stats.record(report.sent, report.failed, now);
        if report.sent > 0 || report.failed > 0 {
            tracing::info!(sent = report.sent, failed = report.failed, "Reminder run finished");
        }
        Ok(report)
    }

    /// Send test reminders for `event` to the given numbers
    pub async fn send_test(
        &self,
        settings: &ReminderSettings,
        event: &CalendarEvent,
        customer_mobile: Option<&str>,
        employee_mobile: Option<&str>,
    ) -> SmsResult<Vec<ReminderDelivery>> {
        if !settings.enabled {
            return Err(SmsError::InvalidReminder("event reminders are not enabled".into()));
        }

        let targets = [
            (RecipientKind::Customer, TEST_CUSTOMER_NAME, customer_mobile),
            (RecipientKind::Employee, TEST_EMPLOYEE_NAME, employee_mobile),
        ];

        let mut deliveries = Vec::new();
        for (kind, name, mobile) in targets {
            let Some(mobile) = mobile.filter(|m| !m.trim().is_empty()) else {
                continue;
            };
            let message = settings.format_message(kind, event, name);
            deliveries.push(self.deliver(event, name, kind, mobile, message).await);
        }

        if deliveries.is_empty() {
            return Err(SmsError::InvalidReminder("no test number configured".into()));
        }
        Ok(deliveries)
    }

    async fn deliver(
        &self,
        event: &CalendarEvent,
        recipient: &str,
        kind: RecipientKind,
        mobile: &str,
        message: String,
    ) -> ReminderDelivery {
        let phone = PhoneNumber::parse_strict(
            mobile,
            &self.config.default_country_code,
            self.config.strict_phone_digits,
        );

        let response = match &phone {
            Ok(phone) => match self.gateway.send(&message, phone.as_str(), None).await {
                Ok(response) => response,
                Err(e) => GatewayResponse::failure(e.to_string()),
            },
            Err(e) => GatewayResponse::failure(e.to_string()),
        };

        ReminderDelivery {
            event: event.name.clone(),
            recipient: recipient.to_string(),
            kind,
            mobile: phone.map(PhoneNumber::into_string).unwrap_or_else(|_| mobile.to_string()),
            message,
            response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::EventContact;
    use crate::infrastructure::memory::{InMemoryCalendar, InMemoryGateway};
    use chrono::{Duration, NaiveTime};

    fn at(date: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M").unwrap()
    }

    fn settings() -> ReminderSettings {
        ReminderSettings {
            enabled: true,
            event_type_filter: "Livraison".into(),
            customer_template: Some("Bonjour {{customer_name}}, livraison {{reference}} le {{start_date}} à {{start_time}}".into()),
            employee_template: Some("{{employee_name}}: {{client}} à {{start_time}}".into()),
            ..Default::default()
        }
    }

    fn event(name: &str, starts_on: &str) -> CalendarEvent {
        CalendarEvent {
            name: name.into(),
            subject: "RDV".into(),
            description: "**Client:** Dupont\n**Référence:** CMD-7\n**Type:** Livraison".into(),
            starts_on: at(starts_on),
            ends_on: Some(at(starts_on) + Duration::hours(1)),
            all_day: false,
            location: None,
        }
    }

    fn contact(name: &str, mobile: Option<&str>, kind: RecipientKind) -> EventContact {
        EventContact { name: name.into(), mobile: mobile.map(str::to_string), kind }
    }

    fn calendar() -> InMemoryCalendar {
        InMemoryCalendar::new()
            .with_event(
                event("EV-1", "2024-03-07 10:00"),
                vec![
                    contact("Ana", Some("0612345678"), RecipientKind::Customer),
                    contact("Bob", None, RecipientKind::Customer),
                    contact("Paul", Some("0698765432"), RecipientKind::Employee),
                ],
            )
            .with_event(event("EV-2", "2024-03-09 10:00"), vec![])
    }

    fn service(gateway: Arc<InMemoryGateway>) -> ReminderService {
        ReminderService::new(gateway, Arc::new(calendar()), SmsConfig::default())
    }

    #[tokio::test]
    async fn test_run_sends_to_customers() {
        let gateway = Arc::new(InMemoryGateway::default());
        let mut stats = ReminderStats::default();
        let now = at("2024-03-06 10:00");

        let report = service(gateway.clone()).run(&settings(), &mut stats, now).await.unwrap();
        assert_eq!(report.events_checked, 1);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 0);

        let sent = gateway.sent();
        assert_eq!(sent[0].to, "+33612345678");
        assert_eq!(sent[0].message, "Bonjour Ana, livraison CMD-7 le 07/03/2024 à 10:00");
        assert_eq!(stats.total_sent, 1);
        assert_eq!(stats.last_check, Some(now));
    }

    #[tokio::test]
    async fn test_run_includes_employees_when_enabled() {
        let gateway = Arc::new(InMemoryGateway::default());
        let mut s = settings();
        s.send_to_employee = true;
        s.send_to_customer_only = true;

        let report = service(gateway.clone())
            .run(&s, &mut ReminderStats::default(), at("2024-03-06 10:00"))
            .await
            .unwrap();
        assert_eq!(report.sent, 2);
        assert_eq!(gateway.sent()[1].message, "Paul: Dupont à 10:00");
    }

    #[tokio::test]
    async fn test_multiple_windows_list_event_once() {
        let mut s = settings();
        s.enable_multiple_reminders = true;
        // two windows overlapping the same event
        s.reminder_times = Some("24,24.25".into());

        let due = service(Arc::new(InMemoryGateway::default()))
            .due_events(&s, at("2024-03-06 10:00"))
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
    }

    #[tokio::test]
    async fn test_participant_failure_does_not_lose_sent_reminders() {
        let gateway = Arc::new(InMemoryGateway::default());
        let calendar = InMemoryCalendar::new()
            .with_event(
                event("EV-1", "2024-03-07 10:00"),
                vec![contact("Ana", Some("0612345678"), RecipientKind::Customer)],
            )
            .with_event(event("EV-3", "2024-03-07 10:15"), vec![])
            .failing_participants_for("EV-3");
        let svc = ReminderService::new(gateway.clone(), Arc::new(calendar), SmsConfig::default());

        let mut stats = ReminderStats::default();
        let report = svc.run(&settings(), &mut stats, at("2024-03-06 10:00")).await.unwrap();
        assert_eq!(report.events_checked, 2);
        assert_eq!((report.sent, report.failed), (1, 1));
        assert_eq!(gateway.sent().len(), 1);
        assert_eq!((stats.total_sent, stats.failed), (1, 1));
    }

    #[tokio::test]
    async fn test_run_skipped_outside_hours() {
        let gateway = Arc::new(InMemoryGateway::default());
        let mut s = settings();
        s.business_hours_only = true;
        s.business_start_time = NaiveTime::from_hms_opt(9, 0, 0);

        let mut stats = ReminderStats::default();
        let report = service(gateway.clone()).run(&s, &mut stats, at("2024-03-06 07:00")).await.unwrap();
        assert_eq!(report.skipped.as_deref(), Some("outside sending hours"));
        assert!(gateway.sent().is_empty());
        assert_eq!(stats, ReminderStats::default());
    }

    #[tokio::test]
    async fn test_refused_reminder_counts_as_failed() {
        let gateway = Arc::new(InMemoryGateway::default());
        gateway.refuse("+33612345678");
        let mut stats = ReminderStats::default();

        let report = service(gateway).run(&settings(), &mut stats, at("2024-03-06 10:00")).await.unwrap();
        assert_eq!((report.sent, report.failed), (0, 1));
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_send_test_reminders() {
        let gateway = Arc::new(InMemoryGateway::default());
        let svc = service(gateway.clone());
        let ev = event("EV-1", "2024-03-07 10:00");

        let deliveries = svc.send_test(&settings(), &ev, Some("0611111111"), Some("0622222222")).await.unwrap();
        assert_eq!(deliveries.len(), 2);
        assert!(deliveries[0].message.starts_with("Bonjour Client Test"));
        assert!(deliveries[1].message.starts_with("Employé Test"));

        assert!(svc.send_test(&settings(), &ev, None, Some(" ")).await.is_err());
        let disabled = ReminderSettings { enabled: false, ..settings() };
        assert!(svc.send_test(&disabled, &ev, Some("0611111111"), None).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_mobile_is_a_failed_delivery() {
        let gateway = Arc::new(InMemoryGateway::default());
        let svc = service(gateway.clone());
        let ev = event("EV-1", "2024-03-07 10:00");

        let deliveries = svc.send_test(&settings(), &ev, Some("123"), None).await.unwrap();
        assert!(!deliveries[0].response.success);
        assert!(gateway.sent().is_empty());
    }
}
