//! Price command

use rust_decimal::Decimal;
use serde::Serialize;
use sms_core::domain::aggregates::{money, NEW_ROW_MARGIN_PERCENT};
use sms_core::{price_line, LinePrice, PricingLine};

use crate::output::{self, OutputFormat};

#[derive(Debug, Serialize)]
struct PriceResult {
    base_rate: Decimal,
    qty: Decimal,
    #[serde(flatten)]
    price: LinePrice,
}

fn line_for(base_rate: Decimal, qty: Decimal, margin_percent: Option<Decimal>, margin_amount: Option<Decimal>) -> PricingLine {
    let line = PricingLine::new_row().with_base_rate(base_rate).with_qty(qty);
    match margin_amount {
        Some(amount) => line.with_amount_margin(amount),
        None => line.with_percentage_margin(margin_percent.unwrap_or(NEW_ROW_MARGIN_PERCENT)),
    }
}

pub fn handle(
    base_rate: Decimal,
    qty: Decimal,
    margin_percent: Option<Decimal>,
    margin_amount: Option<Decimal>,
    format: OutputFormat,
) -> Result<(), String> {
    let line = line_for(base_rate, qty, margin_percent, margin_amount);
    let price = price_line(&line).ok_or("price not computable: base rate and quantity must be non-zero")?;

    let result = PriceResult { base_rate, qty, price };
    let rows = output::key_value(vec![
        ("Base rate", money(base_rate)),
        ("Quantity", qty.normalize().to_string()),
        ("Margin", money(price.margin_value)),
        ("Unit price", money(price.unit_price_with_margin)),
        ("Line amount", money(price.line_amount)),
    ]);
    format.print(&result, &[], rows)
}
