//! Campaign commands

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use sms_core::domain::aggregates::money;
use sms_core::{Campaign, CampaignDocument, CampaignService, CampaignSummary, SenderSelector};

use super::{load_file, write_file, ApiClient};
use crate::config::Config;
use crate::output::{self, OutputFormat};
use crate::remote::LogPublisher;
use crate::CampaignCommands;

#[derive(Debug, Serialize)]
struct AutofillResult {
    rates_filled: usize,
    mobiles_filled: usize,
}

fn load_campaign(path: &Path, config: &Config) -> Result<Campaign, String> {
    let document: CampaignDocument = load_file(path)?;
    Ok(document.into_campaign(&config.sms))
}

fn save_campaign(path: Option<&Path>, campaign: &Campaign) -> Result<(), String> {
    if let Some(path) = path {
        write_file(path, &CampaignDocument::from_campaign(campaign))?;
        tracing::info!(path = %path.display(), "Campaign written");
    }
    Ok(())
}

fn service(client: ApiClient, config: &Config) -> CampaignService {
    let client = Arc::new(client);
    let senders = SenderSelector::new(
        client.clone(),
        config.default_sender.clone(),
        config.sms.fallback_senders.clone(),
        config.sms.sender,
    );
    CampaignService::new(
        client.clone(),
        senders,
        client.clone(),
        client,
        Arc::new(LogPublisher),
        config.sms.clone(),
    )
}

fn summary_rows(summary: &CampaignSummary) -> Vec<Vec<String>> {
    let totals = &summary.totals;
    let currency = &summary.currency;
    output::key_value(vec![
        ("Campaign", summary.title.clone()),
        ("Status", format!("{:?}", summary.status)),
        ("Items", totals.total_items.to_string()),
        ("Customers", totals.total_customers.to_string()),
        ("Estimated revenue", format!("{} {}", money(totals.estimated_revenue), currency)),
        ("Profit potential", format!("{} {}", money(totals.profit_potential), currency)),
        ("Average margin", format!("{}%", money(totals.average_margin_percent))),
        ("SMS cost", format!("{} {}", money(totals.total_sms_cost), currency)),
        ("ROI", format!("{}%", money(summary.roi.roi_percent))),
    ])
}

pub async fn handle(
    action: CampaignCommands,
    client: ApiClient,
    config: &Config,
    format: OutputFormat,
) -> Result<(), String> {
    match action {
        CampaignCommands::Totals { file } => {
            let campaign = load_campaign(&file, config)?;
            let summary = CampaignSummary::of(&campaign, config.sms.per_message_cost);
            format.print(&summary, &[], summary_rows(&summary))
        }
        CampaignCommands::Preview { file, limit } => {
            let campaign = load_campaign(&file, config)?;
            let limit = limit.unwrap_or(config.sms.preview_limit);
            let previews = campaign.previews(limit, &config.sms.default_template);
            if previews.is_empty() {
                return Err("no line selected for sending".into());
            }
            let rows = previews
                .iter()
                .map(|p| {
                    vec![
                        (p.line + 1).to_string(),
                        p.customer.clone(),
                        output::or_dash(p.mobile.as_ref()),
                        p.item.clone(),
                        output::or_dash(p.price.map(money)),
                        p.message.clone(),
                    ]
                })
                .collect();
            format.print(&previews, &["Row", "Customer", "Mobile", "Item", "Price", "Message"], rows)
        }
        CampaignCommands::Validate { file } => {
            let campaign = load_campaign(&file, config)?;
            campaign.validate_for_submit().map_err(|e| e.to_string())?;
            let summary = CampaignSummary::of(&campaign, config.sms.per_message_cost);
            if format.is_table() {
                println!("Campaign '{}' can be submitted", campaign.title());
            }
            format.print(&summary, &[], summary_rows(&summary))
        }
        CampaignCommands::Autofill { file, write } => {
            let mut campaign = load_campaign(&file, config)?;
            let service = service(client, config);
            let result = AutofillResult {
                rates_filled: service.autofill_rates(&mut campaign).await.map_err(|e| e.to_string())?,
                mobiles_filled: service.autofill_mobiles(&mut campaign).await.map_err(|e| e.to_string())?,
            };
            save_campaign(write.as_deref(), &campaign)?;
            let rows = output::key_value(vec![
                ("Rates filled", result.rates_filled.to_string()),
                ("Mobiles filled", result.mobiles_filled.to_string()),
            ]);
            format.print(&result, &[], rows)
        }
        CampaignCommands::Send { file, write } => {
            let mut campaign = load_campaign(&file, config)?;
            campaign.validate_for_submit().map_err(|e| e.to_string())?;
            let report = service(client, config)
                .send_selected(&mut campaign)
                .await
                .map_err(|e| e.to_string())?;
            save_campaign(write.as_deref(), &campaign)?;

            if format.is_table() {
                println!(
                    "Sent {}, failed {} (sender {})",
                    report.sent,
                    report.failed,
                    output::or_dash(report.sender.as_ref())
                );
            }
            let rows = report
                .details
                .iter()
                .map(|d| {
                    vec![
                        (d.line + 1).to_string(),
                        d.customer.clone(),
                        d.item.clone(),
                        output::yes_no(d.success),
                        d.message.clone(),
                    ]
                })
                .collect();
            format.print(&report, &["Row", "Customer", "Item", "Sent", "Message"], rows)?;

            if report.sent == 0 && report.failed > 0 {
                return Err(format!("all {} messages failed", report.failed));
            }
            Ok(())
        }
        CampaignCommands::Test { file, mobile } => {
            let campaign = load_campaign(&file, config)?;
            let response = service(client, config)
                .send_test(&campaign, &mobile)
                .await
                .map_err(|e| e.to_string())?;
            let rows = output::key_value(vec![
                ("Sent", output::yes_no(response.success)),
                ("Message", response.message.clone()),
                ("Sender", output::or_dash(response.sender_used.as_ref())),
                ("Content", output::or_dash(response.content.as_ref())),
            ]);
            format.print(&response, &[], rows)?;

            if response.success {
                Ok(())
            } else {
                Err(response.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sms_core::PricingLine;

    #[test]
    fn test_summary_rows_format_money() {
        let mut campaign = Campaign::create("Spring", "EUR");
        let index = campaign.add_line(
            PricingLine::new_row()
                .with_customer("C1")
                .with_base_rate(dec!(100))
                .with_qty(dec!(2)),
        );
        campaign.reprice_line(index);

        let summary = CampaignSummary::of(&campaign, dec!(0.10));
        let rows = summary_rows(&summary);
        assert_eq!(rows[4], vec!["Estimated revenue".to_string(), "240.00 EUR".to_string()]);
        assert_eq!(rows[6][1], "20.00%");
        assert_eq!(rows[7][1], "0.10 EUR");
    }

    #[test]
    fn test_load_campaign_normalizes() {
        let dir = std::env::temp_dir().join(format!("smsctl-campaign-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("spring.yaml");
        std::fs::write(
            &path,
            "title: Spring\nlines:\n  - customer: C1\n    customer_mobile: \"06 12 34 56 78\"\n    base_rate: 10\n",
        )
        .unwrap();

        let campaign = load_campaign(&path, &Config::default()).unwrap();
        let line = campaign.line(0).unwrap();
        assert_eq!(line.customer_mobile.as_deref(), Some("+33612345678"));
        assert_eq!(line.line_amount, Some(dec!(10)));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
