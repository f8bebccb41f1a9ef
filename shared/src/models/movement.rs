//! Stock movement log models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AdjustmentType, ItemKind, ItemRef};

/// Why an item's stock changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    PurchaseIn,
    PurchaseRevert,
    Sale,
    SaleRevert,
    StockAdjustment,
    ProductionIn,
    ProductionOut,
    ProductionInRevert,
    ProductionOutRevert,
    ReturnIn,
    In,
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::PurchaseIn => "purchase_in",
            MovementType::PurchaseRevert => "purchase_revert",
            MovementType::Sale => "sale",
            MovementType::SaleRevert => "sale_revert",
            MovementType::StockAdjustment => "stock_adjustment",
            MovementType::ProductionIn => "production_in",
            MovementType::ProductionOut => "production_out",
            MovementType::ProductionInRevert => "production_in_revert",
            MovementType::ProductionOutRevert => "production_out_revert",
            MovementType::ReturnIn => "return_in",
            MovementType::In => "in",
            MovementType::Out => "out",
        }
    }

    /// Movements of this type may push stock below zero.
    ///
    /// Only manual adjustments are allowed to do so; every other decrement
    /// is rejected when the item does not hold enough stock.
    pub fn bypasses_stock_guard(&self) -> bool {
        matches!(self, MovementType::StockAdjustment)
    }

    /// The movement type that undoes this one, if the ledger supports undoing it
    pub fn reversal(&self) -> Option<MovementType> {
        match self {
            MovementType::PurchaseIn => Some(MovementType::PurchaseRevert),
            MovementType::Sale => Some(MovementType::SaleRevert),
            MovementType::ProductionIn => Some(MovementType::ProductionInRevert),
            MovementType::ProductionOut => Some(MovementType::ProductionOutRevert),
            _ => None,
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let movement = match s {
            "purchase_in" => MovementType::PurchaseIn,
            "purchase_revert" => MovementType::PurchaseRevert,
            "sale" => MovementType::Sale,
            "sale_revert" => MovementType::SaleRevert,
            "stock_adjustment" => MovementType::StockAdjustment,
            "production_in" => MovementType::ProductionIn,
            "production_out" => MovementType::ProductionOut,
            "production_in_revert" => MovementType::ProductionInRevert,
            "production_out_revert" => MovementType::ProductionOutRevert,
            "return_in" => MovementType::ReturnIn,
            "in" => MovementType::In,
            "out" => MovementType::Out,
            other => return Err(format!("unknown movement type: {}", other)),
        };
        Ok(movement)
    }
}

/// Transaction-specific context attached to a movement entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment_type: Option<AdjustmentType>,
    /// Delivery id of the inbound stock event that caused the movement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// One append-only record of a stock change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementLog {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub collection_name: ItemKind,
    /// Signed change: positive increases stock, negative decreases it
    pub quantity_change: i64,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(flatten)]
    pub context: MovementContext,
}

impl MovementLog {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.collection_name, self.item_id)
    }
}

/// A single signed change a document applies to one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEffect {
    pub item: ItemRef,
    pub item_name: String,
    pub quantity_change: i64,
    pub movement_type: MovementType,
}

impl StockEffect {
    pub fn new(
        item: ItemRef,
        item_name: impl Into<String>,
        quantity_change: i64,
        movement_type: MovementType,
    ) -> Self {
        Self {
            item,
            item_name: item_name.into(),
            quantity_change,
            movement_type,
        }
    }

    /// The exact inverse of this effect, or `None` when the movement type
    /// has no reversal
    pub fn reversed(&self) -> Option<StockEffect> {
        let movement_type = self.movement_type.reversal()?;
        Some(StockEffect {
            item: self.item,
            item_name: self.item_name.clone(),
            quantity_change: -self.quantity_change,
            movement_type,
        })
    }
}

/// Sum of the signed changes recorded for one item
pub fn net_change(entries: &[MovementLog], item: ItemRef) -> i64 {
    entries
        .iter()
        .filter(|entry| entry.item_ref() == item)
        .fold(0i64, |net, entry| net.saturating_add(entry.quantity_change))
}
