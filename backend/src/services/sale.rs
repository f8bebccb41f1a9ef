//! Sale handler

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    has_sufficient_stock, line_subtotal, sale_total, validate_receipt_number, ItemKind, ItemRef,
    MovementContext, Platform, Revenue, Sale, SaleLine, SaleStatus, StockEffect,
    SALE_REVENUE_CATEGORY,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{AuditMode, LedgerBatch, LedgerService, Recorded};
use crate::store::{WriteBatch, WriteOp};

/// One requested sale line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineInput {
    pub item_id: Uuid,
    pub collection_name: ItemKind,
    #[validate(range(min = 1, max = 1000000000))]
    pub quantity: i64,
    /// Defaults to the item's list price
    pub price_per_unit: Option<Decimal>,
}

/// Input for creating a sale
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleInput {
    #[validate(length(min = 1, max = 120))]
    pub customer: String,
    #[validate(length(min = 1))]
    pub items: Vec<SaleLineInput>,
    pub platform: Platform,
    /// Defaults to the platform's initial status
    pub status: Option<SaleStatus>,
    pub date: NaiveDate,
    pub receipt_number: Option<String>,
}

/// Sale service
#[derive(Clone)]
pub struct SaleService {
    ledger: LedgerService,
}

impl SaleService {
    /// Create a new SaleService instance
    pub fn new(ledger: LedgerService) -> Self {
        Self { ledger }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Sale> {
        self.ledger
            .store()
            .get_sale(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }

    /// Record a sale, decrementing stock for every line.
    ///
    /// The whole sale is rejected when any line asks for more than the item
    /// holds; lines naming the same item are checked against their sum.
    pub async fn create_sale(&self, input: CreateSaleInput) -> AppResult<Recorded<Sale>> {
        input.validate()?;
        for line in &input.items {
            line.validate()?;
            if let Some(price) = line.price_per_unit {
                shared::validate_unit_price(price)
                    .map_err(|e| AppError::invalid("price_per_unit", e))?;
            }
        }
        if let Some(receipt) = &input.receipt_number {
            validate_receipt_number(receipt)
                .map_err(|e| AppError::invalid("receipt_number", e))?;
        }

        let mut requested: HashMap<ItemRef, i64> = HashMap::new();
        let mut lines = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let item = self
                .ledger
                .resolve(ItemRef::new(line.collection_name, line.item_id))
                .await?;

            let wanted = requested.entry(item.item_ref()).or_insert(0);
            *wanted = wanted.saturating_add(line.quantity);
            if !has_sufficient_stock(item.stock, *wanted) {
                return Err(AppError::InsufficientStock {
                    item_id: item.id,
                    item_name: item.name,
                    available: item.stock,
                    requested: *wanted,
                });
            }

            let price_per_unit = line.price_per_unit.unwrap_or(item.price);
            let subtotal = line_subtotal(price_per_unit, line.quantity)
                .ok_or_else(|| AppError::invalid("items", "Line subtotal is too large"))?;
            lines.push(SaleLine {
                item_id: item.id,
                item_name: item.name,
                quantity: line.quantity,
                price_per_unit,
                subtotal,
                collection_name: item.kind,
            });
        }

        let total = sale_total(&lines)
            .ok_or_else(|| AppError::invalid("items", "Sale total is too large"))?;
        let status = input
            .status
            .unwrap_or_else(|| input.platform.initial_status());
        let sale = Sale {
            id: Uuid::new_v4(),
            customer: input.customer,
            total,
            items: lines,
            platform: input.platform,
            status,
            date: input.date,
            receipt_number: input.receipt_number,
            created_at: Utc::now(),
        };

        let mut batch = LedgerBatch::new();
        batch.write(WriteOp::InsertSale(sale.clone()));
        if sale.status.is_terminal() {
            batch.write(WriteOp::InsertRevenue(revenue_for(&sale)));
        }
        for (effect, line) in sale.effects().into_iter().zip(&sale.items) {
            batch.post(effect, None, sale_context(&sale, line));
        }

        let recorded = self.ledger.commit(batch, AuditMode::FollowUp).await?;
        tracing::info!(
            sale_id = %sale.id,
            total = %sale.total,
            status = sale.status.as_str(),
            "Sale created"
        );
        Ok(recorded.map(|_| sale))
    }

    /// Move a sale along `Diproses` → `Dikirim` → `Selesai`.
    ///
    /// Entering `Selesai` writes the revenue record in the same batch as a
    /// compare-and-set on the status, so revenue is recognized at most once
    /// even when the same transition is requested concurrently.
    pub async fn transition_status(&self, id: Uuid, to: SaleStatus) -> AppResult<Sale> {
        let mut sale = self.get(id).await?;
        let transition = sale.status.transition(to)?;
        if transition.is_noop() {
            return Ok(sale);
        }

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateSaleStatus {
            id,
            from: transition.from,
            to: transition.to,
        });
        if transition.recognizes_revenue() {
            batch.push(WriteOp::InsertRevenue(revenue_for(&sale)));
        }

        match self.ledger.commit_with_retry(&batch).await {
            Ok(()) => {}
            Err(AppError::InvalidStateTransition(reason)) => {
                // Someone else moved the sale first; fine if they moved it here
                let current = self.get(id).await?;
                if current.status == to {
                    return Ok(current);
                }
                return Err(AppError::InvalidStateTransition(reason));
            }
            Err(e) => return Err(e),
        }

        tracing::info!(
            sale_id = %id,
            from = transition.from.as_str(),
            to = transition.to.as_str(),
            revenue = transition.recognizes_revenue(),
            "Sale status changed"
        );
        sale.status = to;
        Ok(sale)
    }

    /// Delete a sale, restoring its stock and removing its revenue.
    ///
    /// Reversal movements, revenue removal and the document delete commit
    /// as one batch.
    pub async fn delete_sale(&self, id: Uuid) -> AppResult<Sale> {
        let sale = self.get(id).await?;

        let mut batch = LedgerBatch::new();
        batch.write(WriteOp::DeleteSale(id));
        batch.write(WriteOp::DeleteRevenuesFor(id));
        for (effect, line) in sale.effects().iter().zip(&sale.items) {
            if let Some(reversal) = StockEffect::reversed(effect) {
                batch.post(reversal, None, sale_context(&sale, line));
            }
        }

        self.ledger.commit(batch, AuditMode::Atomic).await?;
        tracing::info!(sale_id = %id, total = %sale.total, "Sale deleted");
        Ok(sale)
    }
}

fn revenue_for(sale: &Sale) -> Revenue {
    Revenue {
        id: Uuid::new_v4(),
        date: sale.date,
        category: SALE_REVENUE_CATEGORY.to_string(),
        related_id: Some(sale.id),
        description: sale.revenue_description(),
        amount: sale.total,
    }
}

fn sale_context(sale: &Sale, line: &SaleLine) -> MovementContext {
    MovementContext {
        customer: Some(sale.customer.clone()),
        sale_id: Some(sale.id),
        subtotal: Some(line.subtotal),
        ..Default::default()
    }
}
