//! Output formatting

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use sms_core::Severity;
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Render `data` as JSON or YAML, or as the given table rows
    pub fn render<T: Serialize>(&self, data: &T, header: &[&str], rows: Vec<Vec<String>>) -> Result<String, String> {
        match self {
            OutputFormat::Json => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
            OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| e.to_string()),
            OutputFormat::Table => Ok(table(header, rows)),
        }
    }

    pub fn print<T: Serialize>(&self, data: &T, header: &[&str], rows: Vec<Vec<String>>) -> Result<(), String> {
        println!("{}", self.render(data, header, rows)?.trim_end());
        Ok(())
    }

    pub fn is_table(&self) -> bool {
        matches!(self, OutputFormat::Table)
    }
}

pub fn table(header: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    if !header.is_empty() {
        builder.push_record(header.iter().map(|h| h.to_string()));
    }
    for row in rows {
        builder.push_record(row);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Two-column rows for a single record
pub fn key_value(pairs: Vec<(&str, String)>) -> Vec<Vec<String>> {
    pairs.into_iter().map(|(k, v)| vec![k.to_string(), v]).collect()
}

pub fn or_dash(value: Option<impl ToString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

pub fn yes_no(ok: bool) -> String {
    if ok {
        "yes".green().to_string()
    } else {
        "no".red().to_string()
    }
}

pub fn severity(severity: Severity) -> String {
    match severity {
        Severity::Ok => "ok".green().to_string(),
        Severity::Warning => "warning".yellow().to_string(),
        Severity::Error => "error".red().to_string(),
        Severity::Empty => "empty".dimmed().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_contains_cells() {
        let text = table(&["Number", "Normalized"], vec![vec!["0612".into(), "+33612".into()]]);
        assert!(text.contains("Number"));
        assert!(text.contains("+33612"));
    }

    #[test]
    fn test_json_ignores_rows() {
        let out = OutputFormat::Json.render(&json!({"sent": 2}), &["x"], vec![]).unwrap();
        assert!(out.contains("\"sent\": 2"));
    }

    #[test]
    fn test_yaml_render() {
        let out = OutputFormat::Yaml.render(&json!({"sent": 2}), &[], vec![]).unwrap();
        assert_eq!(out.trim(), "sent: 2");
    }

    #[test]
    fn test_helpers() {
        assert_eq!(key_value(vec![("a", "1".into())]), vec![vec!["a".to_string(), "1".to_string()]]);
        assert_eq!(or_dash(None::<String>), "-");
        assert_eq!(or_dash(Some(3)), "3");
    }
}
