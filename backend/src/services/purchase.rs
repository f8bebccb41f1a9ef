//! Purchase handler

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    purchase_total, validate_unit_price, Expense, ItemKind, ItemRef, MovementContext, Purchase,
    PURCHASE_EXPENSE_CATEGORY,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{AuditMode, LedgerBatch, LedgerService, Recorded};
use crate::store::WriteOp;

/// Input for recording a purchase
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseInput {
    #[serde(rename = "type")]
    pub item_kind: ItemKind,
    pub item_id: Uuid,
    #[validate(range(min = 1, max = 1000000000))]
    pub quantity: i64,
    pub purchase_price: Decimal,
    pub supplier_id: Option<String>,
    pub supplier_name: Option<String>,
    pub note: Option<String>,
    pub date: NaiveDate,
}

/// Purchase service
#[derive(Clone)]
pub struct PurchaseService {
    ledger: LedgerService,
}

impl PurchaseService {
    /// Create a new PurchaseService instance
    pub fn new(ledger: LedgerService) -> Self {
        Self { ledger }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Purchase> {
        self.ledger
            .store()
            .get_purchase(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase".to_string()))
    }

    /// Record a purchase: stock comes in and one expense of the total goes out
    pub async fn create_purchase(&self, input: CreatePurchaseInput) -> AppResult<Recorded<Purchase>> {
        input.validate()?;
        validate_unit_price(input.purchase_price)
            .map_err(|e| AppError::invalid("purchase_price", e))?;

        let item = self
            .ledger
            .resolve(ItemRef::new(input.item_kind, input.item_id))
            .await?;
        let total_price = purchase_total(input.quantity, input.purchase_price)
            .ok_or_else(|| AppError::invalid("purchase_price", "Purchase total is too large"))?;

        let purchase = Purchase {
            id: Uuid::new_v4(),
            item_kind: item.kind,
            item_id: item.id,
            item_name: item.name,
            quantity: input.quantity,
            purchase_price: input.purchase_price,
            total_price,
            supplier_id: input.supplier_id,
            supplier_name: input.supplier_name,
            note: input.note,
            date: input.date,
            created_at: Utc::now(),
        };

        let mut batch = LedgerBatch::new();
        batch.write(WriteOp::InsertPurchase(purchase.clone()));
        batch.write(WriteOp::InsertExpense(Expense {
            id: Uuid::new_v4(),
            date: purchase.date,
            category: PURCHASE_EXPENSE_CATEGORY.to_string(),
            related_id: Some(purchase.id),
            description: purchase.expense_description(),
            amount: purchase.total_price,
        }));
        batch.post(
            purchase.effect(),
            purchase.note.clone(),
            purchase_context(&purchase),
        );

        let recorded = self.ledger.commit(batch, AuditMode::FollowUp).await?;
        tracing::info!(
            purchase_id = %purchase.id,
            item = %purchase.item_ref(),
            total = %purchase.total_price,
            "Purchase recorded"
        );
        Ok(recorded.map(|_| purchase))
    }

    /// Delete a purchase, taking its stock back out and removing its expense.
    ///
    /// Fails with `InsufficientStock` when the purchased stock has already
    /// been consumed.
    pub async fn delete_purchase(&self, id: Uuid) -> AppResult<Purchase> {
        let purchase = self.get(id).await?;

        let mut batch = LedgerBatch::new();
        batch.write(WriteOp::DeletePurchase(id));
        batch.write(WriteOp::DeleteExpensesFor(id));
        if let Some(reversal) = purchase.effect().reversed() {
            batch.post(reversal, None, purchase_context(&purchase));
        }

        self.ledger.commit(batch, AuditMode::Atomic).await?;
        tracing::info!(purchase_id = %id, "Purchase deleted");
        Ok(purchase)
    }
}

fn purchase_context(purchase: &Purchase) -> MovementContext {
    MovementContext {
        purchase_id: Some(purchase.id),
        supplier_name: purchase.supplier_name.clone(),
        total_price: Some(purchase.total_price),
        ..Default::default()
    }
}
