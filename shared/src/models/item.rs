//! Inventory item models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two item variants tracked by the ledger.
///
/// The wire form is the name of the collection holding the item documents,
/// which is also what movement entries record as `collection_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    /// Finished product
    #[serde(rename = "products", alias = "product")]
    Product,
    #[serde(rename = "raw_materials", alias = "raw_material", alias = "material")]
    RawMaterial,
}

impl ItemKind {
    pub fn collection(&self) -> &'static str {
        match self {
            ItemKind::Product => "products",
            ItemKind::RawMaterial => "raw_materials",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "products" | "product" => Ok(ItemKind::Product),
            "raw_materials" | "raw_material" | "material" => Ok(ItemKind::RawMaterial),
            other => Err(format!("unknown item kind: {}", other)),
        }
    }
}

/// Address of one item document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub id: Uuid,
}

impl ItemRef {
    pub fn new(kind: ItemKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    pub fn product(id: Uuid) -> Self {
        Self::new(ItemKind::Product, id)
    }

    pub fn raw_material(id: Uuid) -> Self {
        Self::new(ItemKind::RawMaterial, id)
    }
}

impl std::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// A raw material or finished product with a tracked stock quantity.
///
/// `stock` is a cache of the movement log: it must always equal
/// `opening_stock` plus the sum of every movement recorded for the item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub kind: ItemKind,
    pub name: String,
    pub unit: String,
    pub category: Option<String>,
    pub price: Decimal,
    pub stock: i64,
    pub opening_stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.kind, self.id)
    }

    /// Stock value at the item's list price, saturating at the decimal bounds
    pub fn stock_value(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.stock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&ItemKind::Product).unwrap(),
            "\"products\""
        );
        assert_eq!(
            serde_json::to_string(&ItemKind::RawMaterial).unwrap(),
            "\"raw_materials\""
        );

        let parsed: ItemKind = serde_json::from_str("\"material\"").unwrap();
        assert_eq!(parsed, ItemKind::RawMaterial);
    }

    #[test]
    fn test_item_kind_from_path_segment() {
        assert_eq!("products".parse::<ItemKind>().unwrap(), ItemKind::Product);
        assert_eq!(
            "raw_materials".parse::<ItemKind>().unwrap(),
            ItemKind::RawMaterial
        );
        assert!("customers".parse::<ItemKind>().is_err());
    }

    #[test]
    fn test_stock_value() {
        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4(),
            kind: ItemKind::Product,
            name: "Keripik Pedas".to_string(),
            unit: "pack".to_string(),
            category: None,
            price: Decimal::from(12_500),
            stock: 4,
            opening_stock: 4,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(item.stock_value(), Decimal::from(50_000));
    }
}
