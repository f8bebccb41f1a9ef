//! Item master data: the minimum the ledger needs to post against

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{validate_name, validate_opening_stock, validate_unit_price, Item, ItemKind, ItemRef};
use uuid::Uuid;
use validator::Validate;

use crate::config::InventoryConfig;
use crate::error::{AppError, AppResult};
use crate::services::ledger::LedgerService;
use crate::store::{WriteBatch, WriteOp};

/// Input for creating a product or raw material
#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemInput {
    pub kind: ItemKind,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 32))]
    pub unit: String,
    pub category: Option<String>,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub opening_stock: i64,
}

/// Items at or below their low-stock threshold
#[derive(Debug, Clone, Serialize)]
pub struct LowStockReport {
    pub product_threshold: i64,
    pub material_threshold: i64,
    pub products: Vec<Item>,
    pub raw_materials: Vec<Item>,
}

/// Item service
#[derive(Clone)]
pub struct ItemService {
    ledger: LedgerService,
}

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(ledger: LedgerService) -> Self {
        Self { ledger }
    }

    /// Create an item whose stock starts at its opening stock
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<Item> {
        input.validate()?;
        validate_name(&input.name).map_err(|e| AppError::invalid("name", e))?;
        validate_unit_price(input.price).map_err(|e| AppError::invalid("price", e))?;
        validate_opening_stock(input.opening_stock)
            .map_err(|e| AppError::invalid("opening_stock", e))?;

        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4(),
            kind: input.kind,
            name: input.name.trim().to_string(),
            unit: input.unit,
            category: input.category,
            price: input.price,
            stock: input.opening_stock,
            opening_stock: input.opening_stock,
            created_at: now,
            updated_at: now,
        };

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertItem(item.clone()));
        self.ledger.commit_with_retry(&batch).await?;

        tracing::info!(item = %item.item_ref(), name = %item.name, "Item created");
        Ok(item)
    }

    pub async fn get_item(&self, item: ItemRef) -> AppResult<Item> {
        self.ledger.resolve(item).await
    }

    pub async fn list_items(&self, kind: ItemKind) -> AppResult<Vec<Item>> {
        self.ledger.store().list_items(kind).await
    }

    /// Products and raw materials running low, lowest stock first
    pub async fn low_stock(&self, thresholds: &InventoryConfig) -> AppResult<LowStockReport> {
        let below = |mut items: Vec<Item>, threshold: i64| {
            items.retain(|item| item.stock <= threshold);
            items.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
            items
        };

        let products = self.list_items(ItemKind::Product).await?;
        let raw_materials = self.list_items(ItemKind::RawMaterial).await?;

        Ok(LowStockReport {
            product_threshold: thresholds.low_stock_product_threshold,
            material_threshold: thresholds.low_stock_material_threshold,
            products: below(products, thresholds.low_stock_product_threshold),
            raw_materials: below(raw_materials, thresholds.low_stock_material_threshold),
        })
    }
}
