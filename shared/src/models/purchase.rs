//! Purchase models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ItemKind, ItemRef, MovementType, StockEffect};

/// Expense category written for every purchase
pub const PURCHASE_EXPENSE_CATEGORY: &str = "Purchase";

/// Stock bought from a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub item_kind: ItemKind,
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity: i64,
    pub purchase_price: Decimal,
    pub total_price: Decimal,
    pub supplier_id: Option<String>,
    pub supplier_name: Option<String>,
    pub note: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.item_kind, self.item_id)
    }

    pub fn effect(&self) -> StockEffect {
        StockEffect::new(
            self.item_ref(),
            self.item_name.clone(),
            self.quantity,
            MovementType::PurchaseIn,
        )
    }

    pub fn expense_description(&self) -> String {
        match &self.supplier_name {
            Some(supplier) => format!("Purchase of {} from {}", self.item_name, supplier),
            None => format!("Purchase of {}", self.item_name),
        }
    }
}

/// Quantity times unit purchase price, `None` when it does not fit a decimal
pub fn purchase_total(quantity: i64, purchase_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity).checked_mul(purchase_price)
}
