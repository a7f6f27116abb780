//! Line pricing

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::PricingLine;
use crate::domain::value_objects::MarginMode;

/// Prices derived from one line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePrice {
    pub unit_price_with_margin: Decimal,
    pub line_amount: Decimal,
    pub margin_value: Decimal,
}

/// Price a line.
///
/// Returns `None` when the line is not computable yet (base rate or quantity
/// missing or zero). That is not a zero price.
pub fn price_line(line: &PricingLine) -> Option<LinePrice> {
    let base_rate = line.base_rate.filter(|r| !r.is_zero())?;
    let qty = line.qty.filter(|q| !q.is_zero())?;

    let base_amount = base_rate * qty;
    let margin_value = match line.margin_mode {
        MarginMode::Percentage => base_amount * line.margin_percent / Decimal::ONE_HUNDRED,
        MarginMode::Amount => line.margin_amount * qty,
    };

    Some(LinePrice {
        unit_price_with_margin: base_rate + margin_value / qty,
        // Same value as unit * qty without the division round trip
        line_amount: base_amount + margin_value,
        margin_value,
    })
}
