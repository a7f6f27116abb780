//! smsctl
//!
//! Command-line interface for SMS pricing campaigns and event reminders.
//!
//! # Usage
//!
//! ```bash
//! smsctl phone normalize "06 12 34 56 78"
//! smsctl sender validate ACME
//! smsctl price --base-rate 100 --qty 2 --margin-percent 20
//! smsctl campaign totals -f spring.yaml
//! smsctl campaign send -f spring.yaml --write spring.yaml
//! smsctl reminder check -f reminders.toml
//! smsctl gateway balance --format json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;
mod remote;

const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Parser)]
#[command(name = "smsctl")]
#[command(version)]
#[command(about = "SMS pricing campaign toolkit", long_about = None)]
struct Cli {
    /// Backend URL
    #[arg(long, env = "SMSCTL_API_URL")]
    api_url: Option<String>,

    /// API token, as `key:secret`
    #[arg(long, env = "SMSCTL_API_KEY")]
    api_key: Option<String>,

    /// Country code for national numbers
    #[arg(long, env = "SMSCTL_COUNTRY_CODE")]
    country_code: Option<String>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize and check phone numbers
    Phone {
        #[command(subcommand)]
        action: PhoneCommands,
    },
    /// Check sender names
    Sender {
        #[command(subcommand)]
        action: SenderCommands,
    },
    /// Price a single line
    Price {
        #[arg(long)]
        base_rate: Decimal,
        #[arg(long, default_value = "1")]
        qty: Decimal,
        /// Markup as a percentage of the base amount
        #[arg(long, conflicts_with = "margin_amount")]
        margin_percent: Option<Decimal>,
        /// Flat markup per unit
        #[arg(long)]
        margin_amount: Option<Decimal>,
    },
    /// Work with campaign files
    Campaign {
        #[command(subcommand)]
        action: CampaignCommands,
    },
    /// Render and check message templates
    Template {
        #[command(subcommand)]
        action: TemplateCommands,
    },
    /// Event reminder settings
    Reminder {
        #[command(subcommand)]
        action: ReminderCommands,
    },
    /// Talk to the SMS backend
    Gateway {
        #[command(subcommand)]
        action: GatewayCommands,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum PhoneCommands {
    /// Normalize one or more numbers
    Normalize { numbers: Vec<String> },
    /// Strict check used before sending
    Check { number: String },
}

#[derive(Subcommand)]
enum SenderCommands {
    /// Validate a sender name
    Validate { name: String },
}

#[derive(Subcommand)]
enum CampaignCommands {
    /// Totals and ROI
    Totals {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Render the first selected messages
    Preview {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Check the campaign can be submitted
    Validate {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Fill missing rates and mobiles from the backend
    Autofill {
        #[arg(short, long)]
        file: PathBuf,
        /// Write the updated campaign here
        #[arg(long)]
        write: Option<PathBuf>,
    },
    /// Send every selected line not yet sent
    Send {
        #[arg(short, long)]
        file: PathBuf,
        /// Write the updated campaign here
        #[arg(long)]
        write: Option<PathBuf>,
    },
    /// Send the first line's message to a test number
    Test {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        mobile: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TemplateKind {
    Campaign,
    Reminder,
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Substitute `key=value` pairs
    Render {
        template: String,
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,
    },
    /// Report unknown or missing variables and length
    Check {
        template: String,
        #[arg(long, value_enum, default_value = "campaign")]
        kind: TemplateKind,
    },
}

#[derive(Subcommand)]
enum ReminderCommands {
    /// Validate a settings file
    Check {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Reminder windows and sending gates at a given time
    Windows {
        #[arg(short, long)]
        file: PathBuf,
        /// `YYYY-MM-DD HH:MM`, defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// Extract structured fields from an event description
    Parse { description: String },
}

#[derive(Subcommand)]
enum GatewayCommands {
    /// Check credentials and reachability
    Test,
    /// Remaining credits
    Balance,
    /// Registered sender names
    Senders,
    /// Register a sender name
    CreateSender {
        name: String,
        #[arg(long, default_value = "SMS campaign sender")]
        description: String,
    },
    /// Sender that would be used right now
    BestSender,
    /// Send one message
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        sender: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match config::Config::load(cli.profile.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unreadable config file");
            config::Config::default()
        }
    };
    if let Some(code) = cli.country_code {
        config.sms.default_country_code = code;
    }
    if let Err(e) = config.sms.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let format = cli.format.unwrap_or_else(|| config.output_format());
    let api_url = cli
        .api_url
        .or_else(|| config.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.into());
    let api_key = cli.api_key.or_else(|| config.api_key.clone());
    let client = commands::ApiClient::new(&api_url, api_key.as_deref());

    let result = match cli.command {
        Commands::Phone { action } => commands::phone::handle(action, &config.sms, format),
        Commands::Sender { action } => commands::sender::handle(action, &config.sms, format),
        Commands::Price { base_rate, qty, margin_percent, margin_amount } => {
            commands::price::handle(base_rate, qty, margin_percent, margin_amount, format)
        }
        Commands::Campaign { action } => commands::campaign::handle(action, client, &config, format).await,
        Commands::Template { action } => commands::template::handle(action, &config.sms, format),
        Commands::Reminder { action } => commands::reminder::handle(action, format),
        Commands::Gateway { action } => commands::gateway::handle(action, client, &config, format).await,
        Commands::Config { action } => commands::config::handle(action, cli.profile.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_price() {
        let cli = Cli::try_parse_from(["smsctl", "price", "--base-rate", "9.99", "--margin-amount", "2"]).unwrap();
        match cli.command {
            Commands::Price { base_rate, qty, margin_percent, margin_amount } => {
                assert_eq!(base_rate, dec!(9.99));
                assert_eq!(qty, dec!(1));
                assert_eq!(margin_percent, None);
                assert_eq!(margin_amount, Some(dec!(2)));
            }
            _ => panic!("expected price command"),
        }
    }

    #[test]
    fn test_margin_flags_conflict() {
        let parsed = Cli::try_parse_from([
            "smsctl", "price", "--base-rate", "1", "--margin-percent", "5", "--margin-amount", "2",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parse_template_vars() {
        let cli = Cli::try_parse_from([
            "smsctl", "--format", "json", "template", "render", "Hi {{name}}", "--var", "name=Ana",
        ])
        .unwrap();
        assert!(matches!(cli.format, Some(output::OutputFormat::Json)));
        match cli.command {
            Commands::Template { action: TemplateCommands::Render { template, vars } } => {
                assert_eq!(template, "Hi {{name}}");
                assert_eq!(vars, vec!["name=Ana"]);
            }
            _ => panic!("expected template render"),
        }
    }

    #[test]
    fn test_parse_campaign_send() {
        let cli = Cli::try_parse_from(["smsctl", "campaign", "send", "-f", "c.yaml", "--write", "out.yaml"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Campaign { action: CampaignCommands::Send { write: Some(_), .. } }
        ));
    }
}
