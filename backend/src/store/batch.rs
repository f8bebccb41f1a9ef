//! Atomic write batches

use chrono::{DateTime, Utc};
use shared::{
    Item, ItemRef, MovementLog, Production, ProductionStatus, Purchase, Revenue, Sale,
    SaleStatus, StockAdjustment, StockReturn, Expense,
};
use uuid::Uuid;

/// Whether an increment may leave the item below zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockGuard {
    /// Decrements that would leave the stock negative fail with
    /// `InsufficientStock`
    NonNegative,
    Unchecked,
}

/// One document write inside a batch
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Server-side `stock = stock + delta`; never a client-computed value
    IncrementStock {
        item: ItemRef,
        item_name: String,
        delta: i64,
        guard: StockGuard,
    },
    /// Overwrite the cached stock, used only when repairing from the log
    SetStock { item: ItemRef, stock: i64 },
    InsertItem(Item),
    InsertSale(Sale),
    /// Compare-and-set on the sale status
    UpdateSaleStatus {
        id: Uuid,
        from: SaleStatus,
        to: SaleStatus,
    },
    DeleteSale(Uuid),
    InsertProduction(Production),
    /// Replace a production unless it changed since `previous_update`
    ReplaceProduction {
        production: Production,
        previous_update: DateTime<Utc>,
    },
    UpdateProductionStatus { id: Uuid, status: ProductionStatus },
    DeleteProduction(Uuid),
    InsertPurchase(Purchase),
    DeletePurchase(Uuid),
    InsertReturn(StockReturn),
    InsertAdjustment(StockAdjustment),
    InsertRevenue(Revenue),
    /// Remove every revenue linked to the given document
    DeleteRevenuesFor(Uuid),
    InsertExpense(Expense),
    /// Remove every expense linked to the given document
    DeleteExpensesFor(Uuid),
    AppendMovement(MovementLog),
    /// Hold a movement entry as pending until the log confirms it
    QueueMovement(MovementLog),
    /// Record a delivered event id; fails with `DuplicateEvent` when seen before
    ClaimEvent(String),
}

/// Ordered set of writes committed all-or-nothing
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Extend<WriteOp> for WriteBatch {
    fn extend<T: IntoIterator<Item = WriteOp>>(&mut self, iter: T) {
        self.ops.extend(iter);
    }
}
