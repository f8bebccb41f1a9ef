//! Shared fixtures for the ledger integration tests
#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{Item, ItemKind, ItemRef, MovementLog};
use stock_ledger_backend::{
    config::LedgerConfig,
    services::{item::CreateItemInput, ItemService, LedgerService},
    store::{DocumentStore, MemoryStore},
};

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub ledger: LedgerService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_attempts(5)
    }

    pub fn with_attempts(max_commit_attempts: u32) -> Self {
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn DocumentStore> = store.clone();
        let ledger = LedgerService::new(dyn_store, &LedgerConfig { max_commit_attempts });
        Self { store, ledger }
    }

    pub async fn item(&self, kind: ItemKind, name: &str, opening_stock: i64) -> Item {
        self.priced_item(kind, name, opening_stock, Decimal::from(10_000))
            .await
    }

    pub async fn priced_item(
        &self,
        kind: ItemKind,
        name: &str,
        opening_stock: i64,
        price: Decimal,
    ) -> Item {
        ItemService::new(self.ledger.clone())
            .create_item(CreateItemInput {
                kind,
                name: name.to_string(),
                unit: "pcs".to_string(),
                category: None,
                price,
                opening_stock,
            })
            .await
            .expect("seed item")
    }

    pub async fn product(&self, name: &str, opening_stock: i64) -> Item {
        self.item(ItemKind::Product, name, opening_stock).await
    }

    pub async fn material(&self, name: &str, opening_stock: i64) -> Item {
        self.item(ItemKind::RawMaterial, name, opening_stock).await
    }

    pub async fn stock(&self, item: ItemRef) -> i64 {
        self.ledger.resolve(item).await.expect("item exists").stock
    }

    pub async fn movements(&self, item: ItemRef) -> Vec<MovementLog> {
        self.ledger.movements_for(item).await.expect("movements")
    }

    /// Every item's stock equals its opening stock plus its movements
    pub async fn assert_conserved(&self) {
        let report = self.ledger.reconcile(false).await.expect("reconcile");
        assert!(
            report.discrepancies.is_empty(),
            "stock drifted from movement log: {:?}",
            report.discrepancies
        );
    }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).expect("valid date")
}
