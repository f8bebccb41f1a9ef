//! Cash flow records and profit/loss summary

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{summarize, DateRange, Expense, FinanceSummary, Revenue, MAX_AMOUNT};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::ledger::LedgerService;
use crate::store::{WriteBatch, WriteOp};

/// Input for a manual revenue or expense entry
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CashEntryInput {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 64))]
    pub category: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
    pub related_id: Option<Uuid>,
}

impl CashEntryInput {
    fn check(&self) -> AppResult<()> {
        self.validate()?;
        if self.amount <= Decimal::ZERO {
            return Err(AppError::invalid("amount", "Amount must be greater than zero"));
        }
        if self.amount > MAX_AMOUNT {
            return Err(AppError::invalid("amount", "Amount is too large"));
        }
        Ok(())
    }
}

/// Finance service
#[derive(Clone)]
pub struct FinanceService {
    ledger: LedgerService,
}

impl FinanceService {
    /// Create a new FinanceService instance
    pub fn new(ledger: LedgerService) -> Self {
        Self { ledger }
    }

    pub async fn record_revenue(&self, input: CashEntryInput) -> AppResult<Revenue> {
        input.check()?;
        let revenue = Revenue {
            id: Uuid::new_v4(),
            date: input.date,
            category: input.category,
            related_id: input.related_id,
            description: input.description,
            amount: input.amount,
        };

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertRevenue(revenue.clone()));
        self.ledger.commit_with_retry(&batch).await?;

        tracing::info!(revenue_id = %revenue.id, amount = %revenue.amount, "Revenue recorded");
        Ok(revenue)
    }

    pub async fn record_expense(&self, input: CashEntryInput) -> AppResult<Expense> {
        input.check()?;
        let expense = Expense {
            id: Uuid::new_v4(),
            date: input.date,
            category: input.category,
            related_id: input.related_id,
            description: input.description,
            amount: input.amount,
        };

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertExpense(expense.clone()));
        self.ledger.commit_with_retry(&batch).await?;

        tracing::info!(expense_id = %expense.id, amount = %expense.amount, "Expense recorded");
        Ok(expense)
    }

    pub async fn list_revenues(&self) -> AppResult<Vec<Revenue>> {
        self.ledger.store().list_revenues().await
    }

    pub async fn list_expenses(&self) -> AppResult<Vec<Expense>> {
        self.ledger.store().list_expenses().await
    }

    /// Total revenue, total expense and net over an optional date range
    pub async fn summary(&self, range: Option<DateRange>) -> AppResult<FinanceSummary> {
        if let Some(r) = &range {
            if r.start > r.end {
                return Err(AppError::invalid("range", "Start date must not be after end date"));
            }
        }

        let revenues = self.list_revenues().await?;
        let expenses = self.list_expenses().await?;
        Ok(summarize(&revenues, &expenses, range.as_ref()))
    }
}
