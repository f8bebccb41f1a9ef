//! Document store seam
//!
//! The ledger is built entirely on two primitives of the underlying store:
//! an atomic multi-document [`WriteBatch`] (with server-side guarded stock
//! increments) and an append-only movement log. [`PgStore`] backs production
//! deployments; [`MemoryStore`] backs tests and throwaway development runs.

mod batch;
mod memory;
mod postgres;

use async_trait::async_trait;
use shared::{Expense, Item, ItemKind, ItemRef, MovementLog, Production, Purchase, Revenue, Sale};
use uuid::Uuid;

use crate::error::AppResult;

pub use batch::{StockGuard, WriteBatch, WriteOp};
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_item(&self, item: ItemRef) -> AppResult<Option<Item>>;

    async fn list_items(&self, kind: ItemKind) -> AppResult<Vec<Item>>;

    async fn get_sale(&self, id: Uuid) -> AppResult<Option<Sale>>;

    async fn get_production(&self, id: Uuid) -> AppResult<Option<Production>>;

    async fn get_purchase(&self, id: Uuid) -> AppResult<Option<Purchase>>;

    /// Revenues, newest first
    async fn list_revenues(&self) -> AppResult<Vec<Revenue>>;

    /// Expenses, newest first
    async fn list_expenses(&self) -> AppResult<Vec<Expense>>;

    /// The whole movement log, newest first
    async fn list_movements(&self) -> AppResult<Vec<MovementLog>>;

    /// Append entries to the movement log outside of any batch.
    ///
    /// Entries already in the log are skipped, and appended entries leave
    /// the pending queue.
    async fn append_movements(&self, entries: &[MovementLog]) -> AppResult<()>;

    /// Entries committed with their stock change but not yet in the log
    async fn list_pending_movements(&self) -> AppResult<Vec<MovementLog>>;

    /// Apply every operation of `batch` or none of them
    async fn commit(&self, batch: &WriteBatch) -> AppResult<()>;

    /// Cheap connectivity check for health reporting
    async fn ping(&self) -> AppResult<()>;
}
