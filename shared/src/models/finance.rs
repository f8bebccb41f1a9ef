//! Cash flow models (revenues and expenses)

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::DateRange;

/// Money coming in. `related_id` links revenue recognized from a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revenue {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub category: String,
    pub related_id: Option<Uuid>,
    pub description: String,
    pub amount: Decimal,
}

/// Money going out. `related_id` links the expense of a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub category: String,
    pub related_id: Option<Uuid>,
    pub description: String,
    pub amount: Decimal,
}

/// Profit and loss totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    pub total_revenue: Decimal,
    pub total_expense: Decimal,
    pub net: Decimal,
}

/// Totals over the records falling inside `range` (all records when `None`)
pub fn summarize(
    revenues: &[Revenue],
    expenses: &[Expense],
    range: Option<&DateRange>,
) -> FinanceSummary {
    let in_range = |date: NaiveDate| range.map_or(true, |r| r.contains(date));

    let total_revenue: Decimal = revenues
        .iter()
        .filter(|r| in_range(r.date))
        .fold(Decimal::ZERO, |total, r| total.saturating_add(r.amount));
    let total_expense: Decimal = expenses
        .iter()
        .filter(|e| in_range(e.date))
        .fold(Decimal::ZERO, |total, e| total.saturating_add(e.amount));

    FinanceSummary {
        total_revenue,
        total_expense,
        net: total_revenue.saturating_sub(total_expense),
    }
}
