//! Sale models and the sale status state machine

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{ItemKind, ItemRef, MovementType, StockEffect};

/// Revenue category written when a sale is recognized
pub const SALE_REVENUE_CATEGORY: &str = "Sale";

/// Sales channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "Offline Store")]
    OfflineStore,
    Shopee,
    Tokopedia,
    TikTok,
    WhatsApp,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::OfflineStore => "Offline Store",
            Platform::Shopee => "Shopee",
            Platform::Tokopedia => "Tokopedia",
            Platform::TikTok => "TikTok",
            Platform::WhatsApp => "WhatsApp",
        }
    }

    /// Status a new sale starts in when the caller does not pick one.
    /// Walk-in sales are handed over immediately.
    pub fn initial_status(&self) -> SaleStatus {
        match self {
            Platform::OfflineStore => SaleStatus::Completed,
            _ => SaleStatus::Processing,
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Offline Store" => Ok(Platform::OfflineStore),
            "Shopee" => Ok(Platform::Shopee),
            "Tokopedia" => Ok(Platform::Tokopedia),
            "TikTok" => Ok(Platform::TikTok),
            "WhatsApp" => Ok(Platform::WhatsApp),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// Fulfilment status of a sale: `Diproses` → `Dikirim` → `Selesai`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleStatus {
    #[serde(rename = "Diproses")]
    Processing,
    #[serde(rename = "Dikirim")]
    Shipped,
    /// Terminal: revenue is recognized on entry
    #[serde(rename = "Selesai")]
    Completed,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Processing => "Diproses",
            SaleStatus::Shipped => "Dikirim",
            SaleStatus::Completed => "Selesai",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SaleStatus::Completed)
    }

    /// Validate a move from `self` to `to`.
    ///
    /// Re-requesting the current status is accepted as a no-op so that a
    /// repeated "complete" click never recognizes revenue twice.
    pub fn transition(self, to: SaleStatus) -> Result<StatusTransition, TransitionError> {
        let allowed = matches!(
            (self, to),
            (SaleStatus::Processing, SaleStatus::Shipped)
                | (SaleStatus::Shipped, SaleStatus::Completed)
        );

        if self == to || allowed {
            Ok(StatusTransition { from: self, to })
        } else {
            Err(TransitionError::NotAllowed { from: self, to })
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Diproses" => Ok(SaleStatus::Processing),
            "Dikirim" => Ok(SaleStatus::Shipped),
            "Selesai" => Ok(SaleStatus::Completed),
            other => Err(format!("unknown sale status: {}", other)),
        }
    }
}

/// An accepted status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: SaleStatus,
    pub to: SaleStatus,
}

impl StatusTransition {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }

    /// Entering the terminal state recognizes the sale's revenue
    pub fn recognizes_revenue(&self) -> bool {
        !self.is_noop() && self.to.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot move a sale from {from} to {to}")]
    NotAllowed { from: SaleStatus, to: SaleStatus },
}

/// One line of a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub item_id: Uuid,
    pub item_name: String,
    pub quantity: i64,
    pub price_per_unit: Decimal,
    pub subtotal: Decimal,
    pub collection_name: ItemKind,
}

impl SaleLine {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.collection_name, self.item_id)
    }
}

/// A sale of products and/or raw materials to a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub customer: String,
    pub items: Vec<SaleLine>,
    pub platform: Platform,
    pub status: SaleStatus,
    pub total: Decimal,
    pub date: NaiveDate,
    pub receipt_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Stock effects of recording this sale
    pub fn effects(&self) -> Vec<StockEffect> {
        self.items
            .iter()
            .map(|line| {
                StockEffect::new(
                    line.item_ref(),
                    line.item_name.clone(),
                    -line.quantity,
                    MovementType::Sale,
                )
            })
            .collect()
    }

    /// Description used on the revenue record, e.g. `Sale: Keripik (3), Sambal (1)`
    pub fn revenue_description(&self) -> String {
        let names: Vec<String> = self
            .items
            .iter()
            .map(|line| format!("{} ({})", line.item_name, line.quantity))
            .collect();
        format!("{}: {}", SALE_REVENUE_CATEGORY, names.join(", "))
    }
}

/// Subtotal of one line: unit price times quantity, `None` on overflow
pub fn line_subtotal(price_per_unit: Decimal, quantity: i64) -> Option<Decimal> {
    price_per_unit.checked_mul(Decimal::from(quantity))
}

/// Total of a sale: the sum of its line subtotals, `None` on overflow
pub fn sale_total(lines: &[SaleLine]) -> Option<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |total, line| total.checked_add(line.subtotal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(SaleStatus::Processing.transition(SaleStatus::Shipped).is_ok());
        assert!(SaleStatus::Shipped.transition(SaleStatus::Completed).is_ok());
    }

    #[test]
    fn test_backward_and_skipping_transitions_rejected() {
        assert!(SaleStatus::Completed.transition(SaleStatus::Processing).is_err());
        assert!(SaleStatus::Shipped.transition(SaleStatus::Processing).is_err());
        assert!(SaleStatus::Processing.transition(SaleStatus::Completed).is_err());
    }

    #[test]
    fn test_revenue_recognized_once() {
        let entering = SaleStatus::Shipped.transition(SaleStatus::Completed).unwrap();
        assert!(entering.recognizes_revenue());

        let repeated = SaleStatus::Completed.transition(SaleStatus::Completed).unwrap();
        assert!(repeated.is_noop());
        assert!(!repeated.recognizes_revenue());

        let shipping = SaleStatus::Processing.transition(SaleStatus::Shipped).unwrap();
        assert!(!shipping.recognizes_revenue());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&SaleStatus::Completed).unwrap(),
            "\"Selesai\""
        );
        assert_eq!("Dikirim".parse::<SaleStatus>().unwrap(), SaleStatus::Shipped);
        assert_eq!(
            serde_json::to_string(&Platform::OfflineStore).unwrap(),
            "\"Offline Store\""
        );
    }

    #[test]
    fn test_offline_store_starts_completed() {
        assert_eq!(Platform::OfflineStore.initial_status(), SaleStatus::Completed);
        assert_eq!(Platform::Shopee.initial_status(), SaleStatus::Processing);
    }

    #[test]
    fn test_totals_and_description() {
        let lines = vec![
            SaleLine {
                item_id: Uuid::new_v4(),
                item_name: "Keripik".to_string(),
                quantity: 3,
                price_per_unit: Decimal::from(15_000),
                subtotal: Decimal::from(45_000),
                collection_name: ItemKind::Product,
            },
            SaleLine {
                item_id: Uuid::new_v4(),
                item_name: "Sambal".to_string(),
                quantity: 1,
                price_per_unit: Decimal::from(20_000),
                subtotal: Decimal::from(20_000),
                collection_name: ItemKind::Product,
            },
        ];
        assert_eq!(sale_total(&lines), Some(Decimal::from(65_000)));
        assert_eq!(line_subtotal(Decimal::from(15_000), 3), Some(Decimal::from(45_000)));
        assert_eq!(line_subtotal(Decimal::MAX, 2), None);

        let sale = Sale {
            id: Uuid::new_v4(),
            customer: "Pak Budi".to_string(),
            total: Decimal::from(65_000),
            items: lines,
            platform: Platform::Shopee,
            status: SaleStatus::Processing,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            receipt_number: None,
            created_at: Utc::now(),
        };
        assert_eq!(sale.revenue_description(), "Sale: Keripik (3), Sambal (1)");
        assert!(sale.effects().iter().all(|e| e.quantity_change < 0));
    }
}
