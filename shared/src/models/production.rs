//! Production models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{ItemRef, MovementType, StockEffect};

/// Production status. Metadata only: stock effects are applied when a
/// production is saved, whatever its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductionStatus {
    #[default]
    Pending,
    Completed,
}

impl ProductionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionStatus::Pending => "pending",
            ProductionStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for ProductionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProductionStatus::Pending),
            "completed" => Ok(ProductionStatus::Completed),
            other => Err(format!("unknown production status: {}", other)),
        }
    }
}

/// Item and quantity as submitted by a production form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ComponentInput {
    pub item_id: Uuid,
    #[validate(range(min = 1, max = 1000000000))]
    pub quantity: i64,
}

/// A raw material consumed by a production
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionMaterial {
    pub material_id: Uuid,
    pub name: String,
    pub quantity: i64,
}

/// The finished product a production yields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionResult {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
}

/// A recipe execution converting raw materials into one finished product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub status: ProductionStatus,
    pub materials: Vec<ProductionMaterial>,
    pub product_result: ProductionResult,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Production {
    /// Stock effects of saving this production: every material is consumed,
    /// the result is produced.
    pub fn effects(&self) -> Vec<StockEffect> {
        let mut effects: Vec<StockEffect> = self
            .materials
            .iter()
            .map(|m| {
                StockEffect::new(
                    ItemRef::raw_material(m.material_id),
                    m.name.clone(),
                    -m.quantity,
                    MovementType::ProductionOut,
                )
            })
            .collect();

        effects.push(StockEffect::new(
            ItemRef::product(self.product_result.product_id),
            self.product_result.name.clone(),
            self.product_result.quantity,
            MovementType::ProductionIn,
        ));

        effects
    }

    /// Effects that undo [`Production::effects`] exactly
    pub fn reversal_effects(&self) -> Vec<StockEffect> {
        self.effects()
            .iter()
            .filter_map(StockEffect::reversed)
            .collect()
    }
}
