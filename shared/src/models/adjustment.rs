//! Manual stock adjustment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ItemKind, ItemRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentType {
    Increase,
    Decrease,
}

impl AdjustmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentType::Increase => "Increase",
            AdjustmentType::Decrease => "Decrease",
        }
    }

    /// Signed delta for an unsigned amount
    pub fn signed(&self, amount: i64) -> i64 {
        match self {
            AdjustmentType::Increase => amount,
            AdjustmentType::Decrease => -amount,
        }
    }
}

impl std::fmt::Display for AdjustmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdjustmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Increase" => Ok(AdjustmentType::Increase),
            "Decrease" => Ok(AdjustmentType::Decrease),
            other => Err(format!("unknown adjustment type: {}", other)),
        }
    }
}

/// A manual stock correction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub collection_name: ItemKind,
    pub adjustment_type: AdjustmentType,
    pub amount: i64,
    pub delta: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl StockAdjustment {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.collection_name, self.item_id)
    }
}
