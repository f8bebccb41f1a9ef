//! Customer return models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ItemKind, ItemRef, MovementType, StockEffect};

/// Items physically returned to inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReturn {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub item_kind: ItemKind,
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity: i64,
    pub note: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl StockReturn {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.item_kind, self.item_id)
    }

    pub fn effect(&self) -> StockEffect {
        StockEffect::new(
            self.item_ref(),
            self.item_name.clone(),
            self.quantity,
            MovementType::ReturnIn,
        )
    }
}
