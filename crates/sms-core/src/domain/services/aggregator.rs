//! Campaign aggregation
//!
//! Campaign totals are a pure function of the current lines. Callers reprice
//! the edited line first, then aggregate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::aggregates::PricingLine;

/// Campaign-level totals
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignTotals {
    pub total_items: usize,
    pub total_customers: usize,
    pub estimated_revenue: Decimal,
    pub profit_potential: Decimal,
    /// Margin on cost: profit / (revenue - profit) * 100
    pub average_margin_percent: Decimal,
    pub total_sms_cost: Decimal,
}

/// Aggregate lines into campaign totals.
///
/// Lines without a customer still count as items but not as customers. A line
/// without a computed amount contributes zero revenue.
pub fn aggregate(lines: &[PricingLine], per_message_cost: Decimal) -> CampaignTotals {
    let mut customers = HashSet::new();
    let mut revenue = Decimal::ZERO;
    let mut profit = Decimal::ZERO;

    for line in lines {
        if let Some(customer) = line.customer.as_deref().filter(|c| !c.is_empty()) {
            customers.insert(customer);
        }

        let amount = line.line_amount.unwrap_or_default();
        revenue += amount;
        profit += amount - line.base_amount();
    }

    let cost_basis = revenue - profit;
    let average_margin_percent = if cost_basis > Decimal::ZERO {
        profit / cost_basis * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    CampaignTotals {
        total_items: lines.len(),
        total_customers: customers.len(),
        estimated_revenue: revenue,
        profit_potential: profit,
        average_margin_percent,
        total_sms_cost: Decimal::from(customers.len()) * per_message_cost,
    }
}

/// Return on the messaging spend
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRoi {
    pub roi_percent: Decimal,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
}

impl CampaignRoi {
    pub fn from_totals(totals: &CampaignTotals) -> Self {
        let revenue = totals.estimated_revenue;
        let cost = totals.total_sms_cost;
        let roi_percent = if cost > Decimal::ZERO {
            (revenue - cost) / cost * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        Self { roi_percent, revenue, cost, profit: revenue - cost }
    }
}
