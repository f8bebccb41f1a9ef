//! Inbound stock events
//!
//! Line documents created under a sale or purchase, and adjustment
//! documents, arrive as events with at-least-once delivery. Each event is
//! applied through the ledger in one batch that also claims its delivery id,
//! so a redelivered event is acknowledged without touching stock again.

use serde::{Deserialize, Serialize};
use shared::{
    validate_quantity, AdjustmentType, ItemKind, ItemRef, MovementContext, MovementLog,
    MovementType, StockEffect,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{AuditMode, LedgerBatch, LedgerService};
use crate::store::WriteOp;

fn default_kind() -> ItemKind {
    ItemKind::Product
}

/// A stock-relevant document creation observed by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StockEvent {
    SaleLineCreated {
        event_id: String,
        sale_id: Uuid,
        item_id: Uuid,
        #[serde(default = "default_kind")]
        kind: ItemKind,
        quantity: i64,
    },
    PurchaseLineCreated {
        event_id: String,
        purchase_id: Uuid,
        item_id: Uuid,
        #[serde(default = "default_kind")]
        kind: ItemKind,
        quantity: i64,
    },
    AdjustmentCreated {
        event_id: String,
        item_id: Uuid,
        #[serde(default = "default_kind")]
        kind: ItemKind,
        adjustment_type: AdjustmentType,
        amount: i64,
        reason: Option<String>,
    },
}

impl StockEvent {
    pub fn event_id(&self) -> &str {
        match self {
            StockEvent::SaleLineCreated { event_id, .. }
            | StockEvent::PurchaseLineCreated { event_id, .. }
            | StockEvent::AdjustmentCreated { event_id, .. } => event_id,
        }
    }

    pub fn item(&self) -> ItemRef {
        match self {
            StockEvent::SaleLineCreated { item_id, kind, .. }
            | StockEvent::PurchaseLineCreated { item_id, kind, .. }
            | StockEvent::AdjustmentCreated { item_id, kind, .. } => ItemRef::new(*kind, *item_id),
        }
    }

    /// Signed delta and movement type this event posts
    pub fn posting(&self) -> (i64, MovementType) {
        match self {
            StockEvent::SaleLineCreated { quantity, .. } => (-quantity, MovementType::Sale),
            StockEvent::PurchaseLineCreated { quantity, .. } => (*quantity, MovementType::PurchaseIn),
            StockEvent::AdjustmentCreated {
                adjustment_type,
                amount,
                ..
            } => (adjustment_type.signed(*amount), MovementType::StockAdjustment),
        }
    }

    fn quantity(&self) -> i64 {
        match self {
            StockEvent::SaleLineCreated { quantity, .. }
            | StockEvent::PurchaseLineCreated { quantity, .. } => *quantity,
            StockEvent::AdjustmentCreated { amount, .. } => *amount,
        }
    }

    fn context(&self) -> (Option<String>, MovementContext) {
        let mut context = MovementContext {
            event_id: Some(self.event_id().to_string()),
            ..Default::default()
        };
        let note = match self {
            StockEvent::SaleLineCreated { sale_id, .. } => {
                context.sale_id = Some(*sale_id);
                None
            }
            StockEvent::PurchaseLineCreated { purchase_id, .. } => {
                context.purchase_id = Some(*purchase_id);
                None
            }
            StockEvent::AdjustmentCreated {
                adjustment_type,
                reason,
                ..
            } => {
                context.adjustment_type = Some(*adjustment_type);
                reason.clone()
            }
        };
        (note, context)
    }
}

/// Result of processing one delivery
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriggerOutcome {
    Applied { movement: MovementLog },
    AlreadyApplied { event_id: String },
}

/// Applies stock events through the ledger exactly once per delivery id
#[derive(Clone)]
pub struct StockEventProcessor {
    ledger: LedgerService,
}

impl StockEventProcessor {
    /// Create a new StockEventProcessor instance
    pub fn new(ledger: LedgerService) -> Self {
        Self { ledger }
    }

    pub async fn process(&self, event: StockEvent) -> AppResult<TriggerOutcome> {
        if event.event_id().trim().is_empty() {
            return Err(AppError::invalid("event_id", "Event id is required"));
        }
        validate_quantity(event.quantity()).map_err(|e| AppError::invalid("quantity", e))?;

        let item = self.ledger.resolve(event.item()).await?;
        let (delta, movement_type) = event.posting();
        let (note, context) = event.context();

        let mut batch = LedgerBatch::new();
        batch.write(WriteOp::ClaimEvent(event.event_id().to_string()));
        batch.post(
            StockEffect::new(item.item_ref(), item.name, delta, movement_type),
            note,
            context,
        );

        match self.ledger.commit(batch, AuditMode::Atomic).await {
            Ok(recorded) => {
                let movement = recorded.value.into_iter().next().ok_or_else(|| {
                    AppError::Internal("stock event produced no movement".to_string())
                })?;
                tracing::info!(
                    event_id = event.event_id(),
                    item = %movement.item_ref(),
                    change = movement.quantity_change,
                    "Stock event applied"
                );
                Ok(TriggerOutcome::Applied { movement })
            }
            Err(AppError::DuplicateEvent(event_id)) => {
                tracing::debug!(event_id = %event_id, "Stock event redelivered, skipping");
                Ok(TriggerOutcome::AlreadyApplied { event_id })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let json = r#"{
            "event": "sale_line_created",
            "event_id": "sales/abc/items/1",
            "sale_id": "6f0c1f0e-8a49-4c59-a8b8-2a4a0e3f6a11",
            "item_id": "0d4f6a9c-5b0e-4d4b-9f0e-1c2b3a4d5e6f",
            "quantity": 4
        }"#;
        let event: StockEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_id(), "sales/abc/items/1");
        assert_eq!(event.item().kind, ItemKind::Product);
        assert_eq!(event.posting(), (-4, MovementType::Sale));
    }

    #[test]
    fn test_adjustment_event_posts_signed_delta() {
        let event = StockEvent::AdjustmentCreated {
            event_id: "adj-1".to_string(),
            item_id: Uuid::new_v4(),
            kind: ItemKind::RawMaterial,
            adjustment_type: AdjustmentType::Decrease,
            amount: 3,
            reason: Some("Tumpah".to_string()),
        };
        assert_eq!(event.posting(), (-3, MovementType::StockAdjustment));
        let (note, context) = event.context();
        assert_eq!(note.as_deref(), Some("Tumpah"));
        assert_eq!(context.event_id.as_deref(), Some("adj-1"));
    }
}
