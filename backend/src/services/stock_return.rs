//! Return handler

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared::{ItemKind, ItemRef, MovementContext, StockReturn};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::services::ledger::{AuditMode, LedgerBatch, LedgerService, Recorded};
use crate::store::WriteOp;

/// Input for recording items returned to inventory
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReturnInput {
    #[serde(rename = "type")]
    pub item_kind: ItemKind,
    pub item_id: Uuid,
    #[validate(range(min = 1, max = 1000000000))]
    pub quantity: i64,
    pub date: NaiveDate,
    pub note: Option<String>,
}

/// Return service
#[derive(Clone)]
pub struct ReturnService {
    ledger: LedgerService,
}

impl ReturnService {
    /// Create a new ReturnService instance
    pub fn new(ledger: LedgerService) -> Self {
        Self { ledger }
    }

    pub async fn create_return(&self, input: CreateReturnInput) -> AppResult<Recorded<StockReturn>> {
        input.validate()?;
        let item = self
            .ledger
            .resolve(ItemRef::new(input.item_kind, input.item_id))
            .await?;

        let ret = StockReturn {
            id: Uuid::new_v4(),
            item_kind: item.kind,
            item_id: item.id,
            item_name: item.name,
            quantity: input.quantity,
            note: input.note,
            date: input.date,
            created_at: Utc::now(),
        };

        let mut batch = LedgerBatch::new();
        batch.write(WriteOp::InsertReturn(ret.clone()));
        batch.post(
            ret.effect(),
            ret.note.clone(),
            MovementContext {
                return_id: Some(ret.id),
                ..Default::default()
            },
        );

        let recorded = self.ledger.commit(batch, AuditMode::FollowUp).await?;
        tracing::info!(return_id = %ret.id, item = %ret.item_ref(), "Return recorded");
        Ok(recorded.map(|_| ret))
    }
}
