//! In-process document store
//!
//! A batch is applied to a staged copy of the state and swapped in only when
//! every operation succeeded, which gives the same all-or-nothing behaviour
//! as a database transaction. Fault injection hooks let tests fail a batch
//! midway, force conflicts, or break movement appends.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    Expense, Item, ItemKind, ItemRef, MovementLog, Production, Purchase, Revenue, Sale,
    StockAdjustment, StockReturn,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{DocumentStore, StockGuard, WriteBatch, WriteOp};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct State {
    products: HashMap<Uuid, Item>,
    raw_materials: HashMap<Uuid, Item>,
    sales: HashMap<Uuid, Sale>,
    productions: HashMap<Uuid, Production>,
    purchases: HashMap<Uuid, Purchase>,
    returns: HashMap<Uuid, StockReturn>,
    adjustments: HashMap<Uuid, StockAdjustment>,
    revenues: Vec<Revenue>,
    expenses: Vec<Expense>,
    movements: Vec<MovementLog>,
    pending_movements: Vec<MovementLog>,
    processed_events: HashSet<String>,
}

#[derive(Debug, Default)]
struct Faults {
    fail_at_op: Option<usize>,
    conflicts: u32,
    fail_movement_appends: bool,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    faults: Mutex<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail just before applying operation `index`
    pub async fn fail_next_commit_at(&self, index: usize) {
        self.faults.lock().await.fail_at_op = Some(index);
    }

    /// Make the next `count` commits fail with a transaction conflict
    pub async fn conflict_next_commits(&self, count: u32) {
        self.faults.lock().await.conflicts = count;
    }

    /// Make out-of-batch movement appends fail until switched off
    pub async fn fail_movement_appends(&self, enabled: bool) {
        self.faults.lock().await.fail_movement_appends = enabled;
    }
}

impl State {
    fn items(&self, kind: ItemKind) -> &HashMap<Uuid, Item> {
        match kind {
            ItemKind::Product => &self.products,
            ItemKind::RawMaterial => &self.raw_materials,
        }
    }

    fn items_mut(&mut self, kind: ItemKind) -> &mut HashMap<Uuid, Item> {
        match kind {
            ItemKind::Product => &mut self.products,
            ItemKind::RawMaterial => &mut self.raw_materials,
        }
    }

    fn item_mut(&mut self, item: ItemRef) -> AppResult<&mut Item> {
        self.items_mut(item.kind)
            .get_mut(&item.id)
            .ok_or(AppError::ItemNotFound(item))
    }

    fn apply(&mut self, op: &WriteOp) -> AppResult<()> {
        match op {
            WriteOp::IncrementStock {
                item, delta, guard, ..
            } => {
                let doc = self.item_mut(*item)?;
                let next = doc.stock.checked_add(*delta).ok_or_else(|| {
                    AppError::invalid("quantity", format!("stock of {} would overflow", doc.name))
                })?;
                if *guard == StockGuard::NonNegative && *delta < 0 && next < 0 {
                    return Err(AppError::InsufficientStock {
                        item_id: doc.id,
                        item_name: doc.name.clone(),
                        available: doc.stock,
                        requested: delta.saturating_neg(),
                    });
                }
                doc.stock = next;
                doc.updated_at = Utc::now();
            }
            WriteOp::SetStock { item, stock } => {
                let doc = self.item_mut(*item)?;
                doc.stock = *stock;
                doc.updated_at = Utc::now();
            }
            WriteOp::InsertItem(item) => {
                self.items_mut(item.kind).insert(item.id, item.clone());
            }
            WriteOp::InsertSale(sale) => {
                self.sales.insert(sale.id, sale.clone());
            }
            WriteOp::UpdateSaleStatus { id, from, to } => {
                let sale = self
                    .sales
                    .get_mut(id)
                    .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;
                if sale.status != *from {
                    return Err(AppError::InvalidStateTransition(format!(
                        "sale {} is {}, expected {}",
                        id, sale.status, from
                    )));
                }
                sale.status = *to;
            }
            WriteOp::DeleteSale(id) => {
                self.sales
                    .remove(id)
                    .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;
            }
            WriteOp::InsertProduction(production) => {
                self.productions.insert(production.id, production.clone());
            }
            WriteOp::ReplaceProduction {
                production,
                previous_update,
            } => {
                let slot = self
                    .productions
                    .get_mut(&production.id)
                    .ok_or_else(|| AppError::NotFound("Production".to_string()))?;
                if slot.updated_at != *previous_update {
                    return Err(AppError::TransactionConflict(format!(
                        "production {} changed concurrently",
                        production.id
                    )));
                }
                *slot = production.clone();
            }
            WriteOp::UpdateProductionStatus { id, status } => {
                let production = self
                    .productions
                    .get_mut(id)
                    .ok_or_else(|| AppError::NotFound("Production".to_string()))?;
                production.status = *status;
                production.updated_at = Utc::now();
            }
            WriteOp::DeleteProduction(id) => {
                self.productions
                    .remove(id)
                    .ok_or_else(|| AppError::NotFound("Production".to_string()))?;
            }
            WriteOp::InsertPurchase(purchase) => {
                self.purchases.insert(purchase.id, purchase.clone());
            }
            WriteOp::DeletePurchase(id) => {
                self.purchases
                    .remove(id)
                    .ok_or_else(|| AppError::NotFound("Purchase".to_string()))?;
            }
            WriteOp::InsertReturn(ret) => {
                self.returns.insert(ret.id, ret.clone());
            }
            WriteOp::InsertAdjustment(adjustment) => {
                self.adjustments.insert(adjustment.id, adjustment.clone());
            }
            WriteOp::InsertRevenue(revenue) => self.revenues.push(revenue.clone()),
            WriteOp::DeleteRevenuesFor(related) => {
                self.revenues.retain(|r| r.related_id != Some(*related));
            }
            WriteOp::InsertExpense(expense) => self.expenses.push(expense.clone()),
            WriteOp::DeleteExpensesFor(related) => {
                self.expenses.retain(|e| e.related_id != Some(*related));
            }
            WriteOp::AppendMovement(entry) => self.movements.push(entry.clone()),
            WriteOp::QueueMovement(entry) => self.pending_movements.push(entry.clone()),
            WriteOp::ClaimEvent(event_id) => {
                if !self.processed_events.insert(event_id.clone()) {
                    return Err(AppError::DuplicateEvent(event_id.clone()));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_item(&self, item: ItemRef) -> AppResult<Option<Item>> {
        let state = self.state.lock().await;
        Ok(state.items(item.kind).get(&item.id).cloned())
    }

    async fn list_items(&self, kind: ItemKind) -> AppResult<Vec<Item>> {
        let state = self.state.lock().await;
        let mut items: Vec<Item> = state.items(kind).values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn get_sale(&self, id: Uuid) -> AppResult<Option<Sale>> {
        Ok(self.state.lock().await.sales.get(&id).cloned())
    }

    async fn get_production(&self, id: Uuid) -> AppResult<Option<Production>> {
        Ok(self.state.lock().await.productions.get(&id).cloned())
    }

    async fn get_purchase(&self, id: Uuid) -> AppResult<Option<Purchase>> {
        Ok(self.state.lock().await.purchases.get(&id).cloned())
    }

    async fn list_revenues(&self) -> AppResult<Vec<Revenue>> {
        let mut revenues = self.state.lock().await.revenues.clone();
        revenues.reverse();
        revenues.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(revenues)
    }

    async fn list_expenses(&self) -> AppResult<Vec<Expense>> {
        let mut expenses = self.state.lock().await.expenses.clone();
        expenses.reverse();
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(expenses)
    }

    async fn list_movements(&self) -> AppResult<Vec<MovementLog>> {
        let mut movements = self.state.lock().await.movements.clone();
        // Later appends win ties on equal timestamps
        movements.reverse();
        movements.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(movements)
    }

    async fn append_movements(&self, entries: &[MovementLog]) -> AppResult<()> {
        if self.faults.lock().await.fail_movement_appends {
            return Err(AppError::Internal(
                "movement log unavailable (injected)".to_string(),
            ));
        }
        let mut state = self.state.lock().await;
        let mut logged: HashSet<Uuid> = state.movements.iter().map(|m| m.id).collect();
        for entry in entries {
            if logged.insert(entry.id) {
                state.movements.push(entry.clone());
            }
        }
        state
            .pending_movements
            .retain(|pending| !logged.contains(&pending.id));
        Ok(())
    }

    async fn list_pending_movements(&self) -> AppResult<Vec<MovementLog>> {
        Ok(self.state.lock().await.pending_movements.clone())
    }

    async fn commit(&self, batch: &WriteBatch) -> AppResult<()> {
        let mut state = self.state.lock().await;

        let fail_at = {
            let mut faults = self.faults.lock().await;
            if faults.conflicts > 0 {
                faults.conflicts -= 1;
                return Err(AppError::TransactionConflict(
                    "concurrent write (injected)".to_string(),
                ));
            }
            faults.fail_at_op.take()
        };

        let mut staged = state.clone();
        for (index, op) in batch.ops().iter().enumerate() {
            if fail_at == Some(index) {
                return Err(AppError::Internal(format!(
                    "batch aborted before operation {} (injected)",
                    index
                )));
            }
            staged.apply(op)?;
        }

        *state = staged;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
