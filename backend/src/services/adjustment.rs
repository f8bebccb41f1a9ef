//! Manual stock corrections and generic stock in / stock out

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    purchase_total, validate_unit_price, AdjustmentType, ItemRef, MovementContext, MovementLog,
    MovementType, StockAdjustment, StockEffect,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{AuditMode, LedgerBatch, LedgerService, Recorded};
use crate::store::WriteOp;

/// Input for a manual adjustment
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockInput {
    pub item: ItemRef,
    pub adjustment_type: AdjustmentType,
    #[validate(range(min = 1, max = 1000000000))]
    pub amount: i64,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// Input for receiving stock outside of a purchase
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StockInInput {
    pub item: ItemRef,
    #[validate(range(min = 1, max = 1000000000))]
    pub quantity: i64,
    pub unit_price: Option<Decimal>,
    pub supplier: Option<String>,
    pub note: Option<String>,
}

/// Input for releasing stock outside of a sale
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StockOutInput {
    pub item: ItemRef,
    #[validate(range(min = 1, max = 1000000000))]
    pub quantity: i64,
    pub note: Option<String>,
}

/// Adjustment service
#[derive(Clone)]
pub struct AdjustmentService {
    ledger: LedgerService,
}

impl AdjustmentService {
    /// Create a new AdjustmentService instance
    pub fn new(ledger: LedgerService) -> Self {
        Self { ledger }
    }

    /// Apply a signed correction. Adjustments are exempt from the
    /// non-negative guard.
    pub async fn adjust(&self, input: AdjustStockInput) -> AppResult<Recorded<StockAdjustment>> {
        input.validate()?;
        let item = self.ledger.resolve(input.item).await?;
        let delta = input.adjustment_type.signed(input.amount);

        let adjustment = StockAdjustment {
            id: Uuid::new_v4(),
            item_id: item.id,
            item_name: item.name.clone(),
            collection_name: item.kind,
            adjustment_type: input.adjustment_type,
            amount: input.amount,
            delta,
            reason: input.reason,
            created_at: Utc::now(),
        };

        let mut batch = LedgerBatch::new();
        batch.write(WriteOp::InsertAdjustment(adjustment.clone()));
        batch.post(
            StockEffect::new(item.item_ref(), item.name, delta, MovementType::StockAdjustment),
            Some(adjustment.reason.clone()),
            MovementContext {
                adjustment_type: Some(adjustment.adjustment_type),
                ..Default::default()
            },
        );

        let recorded = self.ledger.commit(batch, AuditMode::FollowUp).await?;
        tracing::info!(
            item = %adjustment.item_ref(),
            delta,
            "Stock adjusted"
        );
        Ok(recorded.map(|_| adjustment))
    }

    pub async fn stock_in(&self, input: StockInInput) -> AppResult<Recorded<MovementLog>> {
        input.validate()?;
        if let Some(price) = input.unit_price {
            validate_unit_price(price).map_err(|e| AppError::invalid("unit_price", e))?;
        }

        let total_price = match input.unit_price {
            Some(price) => Some(
                purchase_total(input.quantity, price)
                    .ok_or_else(|| AppError::invalid("unit_price", "Total price is too large"))?,
            ),
            None => None,
        };
        let context = MovementContext {
            supplier_name: input.supplier,
            total_price,
            ..Default::default()
        };

        self.ledger
            .apply_stock_delta(input.item, input.quantity, MovementType::In, input.note, context)
            .await
    }

    /// Release stock under the non-negative guard
    pub async fn stock_out(&self, input: StockOutInput) -> AppResult<Recorded<MovementLog>> {
        input.validate()?;
        self.ledger
            .apply_stock_delta(
                input.item,
                -input.quantity,
                MovementType::Out,
                input.note,
                MovementContext::default(),
            )
            .await
    }
}
