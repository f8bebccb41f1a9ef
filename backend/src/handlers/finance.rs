//! HTTP handlers for revenues, expenses and the profit/loss summary

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{DateRange, Expense, FinanceSummary, Revenue};

use crate::error::{AppError, AppResult};
use crate::services::finance::{CashEntryInput, FinanceService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

pub async fn record_revenue(
    State(state): State<AppState>,
    Json(input): Json<CashEntryInput>,
) -> AppResult<Json<Revenue>> {
    let service = FinanceService::new(state.ledger());
    let revenue = service.record_revenue(input).await?;
    Ok(Json(revenue))
}

pub async fn list_revenues(State(state): State<AppState>) -> AppResult<Json<Vec<Revenue>>> {
    let service = FinanceService::new(state.ledger());
    let revenues = service.list_revenues().await?;
    Ok(Json(revenues))
}

pub async fn record_expense(
    State(state): State<AppState>,
    Json(input): Json<CashEntryInput>,
) -> AppResult<Json<Expense>> {
    let service = FinanceService::new(state.ledger());
    let expense = service.record_expense(input).await?;
    Ok(Json(expense))
}

pub async fn list_expenses(State(state): State<AppState>) -> AppResult<Json<Vec<Expense>>> {
    let service = FinanceService::new(state.ledger());
    let expenses = service.list_expenses().await?;
    Ok(Json(expenses))
}

/// Profit and loss, over a date range when both ends are given
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<FinanceSummary>> {
    let range = match (query.start, query.end) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)),
        (None, None) => None,
        _ => {
            return Err(AppError::invalid(
                "range",
                "Both start and end are required for a ranged summary",
            ))
        }
    };

    let service = FinanceService::new(state.ledger());
    let summary = service.summary(range).await?;
    Ok(Json(summary))
}
