//! Message templates
//!
//! `{{ name }}` placeholders, substituted from a flat string context.
//! Rendering never fails; validation only reports.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Substitution values keyed by placeholder name
pub type TemplateContext = HashMap<String, String>;

/// Variables a pricing campaign message can use
pub const CAMPAIGN_VARIABLES: &[&str] = &[
    "customer_name",
    "item_name",
    "item_code",
    "final_price",
    "amount",
    "currency",
    "valuation_rate",
    "margin_eur",
    "qty",
    "company",
    "campaign_title",
];

/// Variables every pricing campaign message should carry
pub const CAMPAIGN_REQUIRED_VARIABLES: &[&str] = &["customer_name", "item_name", "final_price"];

/// Variables an event reminder message can use
pub const REMINDER_VARIABLES: &[&str] = &[
    "subject",
    "description",
    "start_date",
    "start_time",
    "event_name",
    "customer_name",
    "employee_name",
    "duration",
    "location",
    "client",
    "reference",
    "type",
    "article",
    "tel_client",
    "email_client",
    "appareil",
    "camion_requis",
];

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Placeholder names in order of appearance, duplicates included
pub fn placeholders(template: &str) -> Vec<String> {
    placeholder_pattern()
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Substitute every placeholder found in `context`; unknown ones stay verbatim
pub fn render(template: &str, context: &TemplateContext) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures| match context.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Advisory findings about a template
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateReport {
    pub missing_required: Vec<String>,
    pub unknown_placeholders: Vec<String>,
    /// Longer than one SMS segment
    pub length_warning: bool,
    pub length: usize,
    /// Segments the raw template would be billed as
    pub segments: usize,
}

impl TemplateReport {
    pub fn is_clean(&self) -> bool {
        self.missing_required.is_empty() && self.unknown_placeholders.is_empty() && !self.length_warning
    }
}

/// Check a template against the known and required variable sets
pub fn validate_template(
    template: &str,
    known: &[&str],
    required: &[&str],
    segment_threshold: usize,
) -> TemplateReport {
    let found = placeholders(template);

    let missing_required = required
        .iter()
        .filter(|name| !found.iter().any(|f| f == *name))
        .map(|name| name.to_string())
        .collect();

    let mut unknown_placeholders: Vec<String> = Vec::new();
    for name in &found {
        if !known.contains(&name.as_str()) && !unknown_placeholders.contains(name) {
            unknown_placeholders.push(name.clone());
        }
    }

    let length = template.chars().count();

    TemplateReport {
        missing_required,
        unknown_placeholders,
        length_warning: length > segment_threshold,
        length,
        segments: segment_count(length, segment_threshold),
    }
}

/// Billed segments for a message of `length` characters
pub fn segment_count(length: usize, segment_threshold: usize) -> usize {
    if length == 0 || segment_threshold == 0 {
        return 1;
    }
    length.div_ceil(segment_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> TemplateContext {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_render_simple() {
        assert_eq!(render("Hello {{name}}", &ctx(&[("name", "Ana")])), "Hello Ana");
    }

    #[test]
    fn test_render_trims_inner_whitespace() {
        assert_eq!(render("Hello {{  name }}!", &ctx(&[("name", "Ana")])), "Hello Ana!");
    }

    #[test]
    fn test_render_keeps_unknown() {
        assert_eq!(render("Hi {{foo}} {{name}}", &ctx(&[("name", "Ana")])), "Hi {{foo}} Ana");
    }

    #[test]
    fn test_render_repeated_and_adjacent() {
        let out = render("{{a}}{{b}}{{a}}", &ctx(&[("a", "1"), ("b", "2")]));
        assert_eq!(out, "121");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let out = render("{{a}}", &ctx(&[("a", "{{b}}"), ("b", "x")]));
        assert_eq!(out, "{{b}}");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("{{ a }} and {{b}} and {{a}}"), vec!["a", "b", "a"]);
        assert!(placeholders("no braces { here }").is_empty());
    }

    #[test]
    fn test_validate_reports_unknown_and_missing() {
        let report = validate_template(
            "Bonjour {{customer_name}}, {{foo}} {{foo}}",
            CAMPAIGN_VARIABLES,
            CAMPAIGN_REQUIRED_VARIABLES,
            160,
        );
        assert_eq!(report.missing_required, vec!["item_name", "final_price"]);
        assert_eq!(report.unknown_placeholders, vec!["foo"]);
        assert!(!report.length_warning);
        assert_eq!(report.segments, 1);
    }

    #[test]
    fn test_padded_required_placeholders_count() {
        let report = validate_template(
            "{{ customer_name }} {{item_name  }} {{  final_price}}",
            CAMPAIGN_VARIABLES,
            CAMPAIGN_REQUIRED_VARIABLES,
            160,
        );
        assert!(report.missing_required.is_empty());
        assert!(report.unknown_placeholders.is_empty());
    }

    #[test]
    fn test_validate_length_warning() {
        let long = "x".repeat(161);
        let report = validate_template(&long, CAMPAIGN_VARIABLES, &[], 160);
        assert!(report.length_warning);
        assert_eq!(report.segments, 2);

        let exact = "é".repeat(160);
        assert!(!validate_template(&exact, CAMPAIGN_VARIABLES, &[], 160).length_warning);
    }

    #[test]
    fn test_default_template_is_clean() {
        let report = validate_template(
            crate::config::DEFAULT_CAMPAIGN_TEMPLATE,
            CAMPAIGN_VARIABLES,
            CAMPAIGN_REQUIRED_VARIABLES,
            160,
        );
        assert!(report.is_clean());
    }

    #[test]
    fn test_segment_count() {
        assert_eq!(segment_count(0, 160), 1);
        assert_eq!(segment_count(160, 160), 1);
        assert_eq!(segment_count(320, 160), 2);
        assert_eq!(segment_count(321, 160), 3);
    }
}
