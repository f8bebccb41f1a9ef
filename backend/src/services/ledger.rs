//! Inventory ledger
//!
//! Every stock mutation in the system goes through [`LedgerService`]. Callers
//! describe what happened as postings on a [`LedgerBatch`] together with the
//! document writes that belong to the same transaction; the ledger turns the
//! postings into guarded server-side increments, commits the batch with
//! bounded conflict retry, and writes the movement log either inside the
//! batch or as a follow-up append whose failure is reported, never hidden.
//! Follow-up entries are queued as pending inside the batch, so a failed
//! append can always be backfilled later.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use shared::{
    net_change, Item, ItemKind, ItemRef, MovementContext, MovementLog, MovementType, StockEffect,
};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::error::{AppError, AppResult};
use crate::store::{DocumentStore, StockGuard, WriteBatch, WriteOp};

/// A committed result together with any gap left in the movement log
#[derive(Debug, Clone, Serialize)]
pub struct Recorded<T> {
    pub value: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_gap: Option<PartialWriteFailure>,
}

impl<T> Recorded<T> {
    pub fn complete(value: T) -> Self {
        Self {
            value,
            audit_gap: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.audit_gap.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Recorded<U> {
        Recorded {
            value: f(self.value),
            audit_gap: self.audit_gap,
        }
    }
}

/// Stock was committed but these movement entries could not be written
#[derive(Debug, Clone, Serialize)]
pub struct PartialWriteFailure {
    pub reason: String,
    pub missing_movements: Vec<MovementLog>,
}

/// Where the movement entries of a batch are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditMode {
    /// Inside the batch: stock and log commit together
    Atomic,
    /// Queued inside the batch and appended after it commits; a failed
    /// append degrades the result and leaves the entries pending
    FollowUp,
}

#[derive(Debug, Clone)]
struct Posting {
    effect: StockEffect,
    note: Option<String>,
    context: MovementContext,
}

/// Stock postings plus the document writes committed with them
#[derive(Debug, Clone, Default)]
pub struct LedgerBatch {
    postings: Vec<Posting>,
    documents: Vec<WriteOp>,
}

impl LedgerBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post one stock effect. Each posting produces its own movement entry.
    pub fn post(&mut self, effect: StockEffect, note: Option<String>, context: MovementContext) {
        self.postings.push(Posting {
            effect,
            note,
            context,
        });
    }

    /// Add a document write to the same transaction
    pub fn write(&mut self, op: WriteOp) {
        self.documents.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty() && self.documents.is_empty()
    }

    /// One increment per touched item, in first-touch order.
    ///
    /// Postings to the same item are netted so that reversing and reapplying
    /// within one batch never fails the guard on an intermediate value. The
    /// increment is only unchecked when every posting to the item bypasses
    /// the guard.
    fn stock_ops(&self) -> AppResult<Vec<WriteOp>> {
        let mut order: Vec<ItemRef> = Vec::new();
        let mut netted: HashMap<ItemRef, (String, i64, bool)> = HashMap::new();

        for posting in &self.postings {
            let effect = &posting.effect;
            let bypass = effect.movement_type.bypasses_stock_guard();
            match netted.get_mut(&effect.item) {
                Some((_, delta, unchecked)) => {
                    *delta = delta.checked_add(effect.quantity_change).ok_or_else(|| {
                        AppError::invalid("quantity", "Stock change is too large")
                    })?;
                    *unchecked &= bypass;
                }
                None => {
                    order.push(effect.item);
                    netted.insert(
                        effect.item,
                        (effect.item_name.clone(), effect.quantity_change, bypass),
                    );
                }
            }
        }

        Ok(order
            .into_iter()
            .filter_map(|item| {
                netted.remove(&item).map(|(item_name, delta, unchecked)| {
                    WriteOp::IncrementStock {
                        item,
                        item_name,
                        delta,
                        guard: if unchecked {
                            StockGuard::Unchecked
                        } else {
                            StockGuard::NonNegative
                        },
                    }
                })
            })
            .collect())
    }

    fn movements(&self) -> Vec<MovementLog> {
        let timestamp = Utc::now();
        self.postings
            .iter()
            .map(|posting| {
                movement_entry(
                    &posting.effect,
                    posting.note.clone(),
                    posting.context.clone(),
                    timestamp,
                )
            })
            .collect()
    }
}

fn movement_entry(
    effect: &StockEffect,
    note: Option<String>,
    context: MovementContext,
    timestamp: chrono::DateTime<Utc>,
) -> MovementLog {
    MovementLog {
        id: Uuid::new_v4(),
        item_id: effect.item.id,
        item_name: effect.item_name.clone(),
        collection_name: effect.item.kind,
        quantity_change: effect.quantity_change,
        movement_type: effect.movement_type,
        timestamp,
        note,
        context,
    }
}

/// Cached stock that disagrees with the replayed movement log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockDiscrepancy {
    pub item: ItemRef,
    pub item_name: String,
    pub recorded: i64,
    pub expected: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub items_checked: usize,
    /// Committed entries still missing from the log, counted in the replay
    pub unlogged_movements: usize,
    /// Pending entries moved into the log before repairing
    pub backfilled: usize,
    pub discrepancies: Vec<StockDiscrepancy>,
    pub repaired: bool,
}

/// Ledger service owning atomic stock mutation and movement logging
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn DocumentStore>,
    max_commit_attempts: u32,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(store: Arc<dyn DocumentStore>, config: &LedgerConfig) -> Self {
        Self {
            store,
            max_commit_attempts: config.max_commit_attempts.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Load an item or fail with `ItemNotFound`
    pub async fn resolve(&self, item: ItemRef) -> AppResult<Item> {
        self.store
            .get_item(item)
            .await?
            .ok_or(AppError::ItemNotFound(item))
    }

    /// Apply a single signed delta to one item and log it
    pub async fn apply_stock_delta(
        &self,
        item: ItemRef,
        delta: i64,
        movement_type: MovementType,
        note: Option<String>,
        context: MovementContext,
    ) -> AppResult<Recorded<MovementLog>> {
        let target = self.resolve(item).await?;

        let mut batch = LedgerBatch::new();
        batch.post(
            StockEffect::new(item, target.name, delta, movement_type),
            note,
            context,
        );

        let Recorded { value, audit_gap } = self.commit(batch, AuditMode::FollowUp).await?;
        let entry = value
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("posting produced no movement".to_string()))?;
        Ok(Recorded {
            value: entry,
            audit_gap,
        })
    }

    /// Append one movement entry outside any stock mutation
    pub async fn record_movement(
        &self,
        item: ItemRef,
        item_name: &str,
        quantity_change: i64,
        movement_type: MovementType,
        note: Option<String>,
        context: MovementContext,
    ) -> AppResult<MovementLog> {
        let effect = StockEffect::new(item, item_name, quantity_change, movement_type);
        let entry = movement_entry(&effect, note, context, Utc::now());
        self.store
            .append_movements(std::slice::from_ref(&entry))
            .await?;
        Ok(entry)
    }

    /// The whole movement log, newest first
    pub async fn list_movements(&self) -> AppResult<Vec<MovementLog>> {
        self.store.list_movements().await
    }

    /// Movement history of one item, newest first
    pub async fn movements_for(&self, item: ItemRef) -> AppResult<Vec<MovementLog>> {
        let entries = self.store.list_movements().await?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.item_ref() == item)
            .collect())
    }

    /// Commit a ledger batch and write its movement entries.
    ///
    /// Returns the movement entries that were (or should have been) written.
    pub async fn commit(
        &self,
        batch: LedgerBatch,
        mode: AuditMode,
    ) -> AppResult<Recorded<Vec<MovementLog>>> {
        let entries = batch.movements();

        let mut writes = WriteBatch::new();
        writes.extend(batch.documents.iter().cloned());
        writes.extend(batch.stock_ops()?);
        match mode {
            AuditMode::Atomic => {
                writes.extend(entries.iter().cloned().map(WriteOp::AppendMovement))
            }
            AuditMode::FollowUp => {
                writes.extend(entries.iter().cloned().map(WriteOp::QueueMovement))
            }
        }

        self.commit_with_retry(&writes).await?;

        tracing::info!(
            operations = writes.len(),
            movements = entries.len(),
            "Ledger batch committed"
        );

        if mode == AuditMode::Atomic || entries.is_empty() {
            return Ok(Recorded::complete(entries));
        }

        match self.store.append_movements(&entries).await {
            Ok(()) => Ok(Recorded::complete(entries)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    missing = entries.len(),
                    "Stock committed but movement log append failed"
                );
                Ok(Recorded {
                    value: entries.clone(),
                    audit_gap: Some(PartialWriteFailure {
                        reason: e.to_string(),
                        missing_movements: entries,
                    }),
                })
            }
        }
    }

    /// Commit plain document writes, retrying transaction conflicts
    pub async fn commit_with_retry(&self, batch: &WriteBatch) -> AppResult<()> {
        let mut attempt = 1;
        loop {
            match self.store.commit(batch).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.max_commit_attempts => {
                    tracing::warn!(attempt, error = %e, "Retrying conflicted batch");
                    attempt += 1;
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Write the entries of a degraded commit into the movement log.
    ///
    /// Entries keep their original ids, so repeating a backfill is harmless.
    pub async fn backfill(&self, gap: &PartialWriteFailure) -> AppResult<usize> {
        if gap.missing_movements.is_empty() {
            return Ok(0);
        }
        self.store.append_movements(&gap.missing_movements).await?;
        tracing::info!(
            backfilled = gap.missing_movements.len(),
            "Movement log gap backfilled"
        );
        Ok(gap.missing_movements.len())
    }

    /// Move every pending entry into the movement log
    pub async fn backfill_pending(&self) -> AppResult<usize> {
        let pending = self.store.list_pending_movements().await?;
        if pending.is_empty() {
            return Ok(0);
        }
        self.store.append_movements(&pending).await?;
        tracing::info!(backfilled = pending.len(), "Pending movements backfilled");
        Ok(pending.len())
    }

    /// Replay the movement log against every item's cached stock.
    ///
    /// Pending entries belong to committed batches and count towards the
    /// replay. With `repair`, pending entries are first moved into the log
    /// (the repair stops if that fails), then items that disagree are
    /// rewritten to the replayed value in one batch.
    pub async fn reconcile(&self, repair: bool) -> AppResult<ReconcileReport> {
        let backfilled = if repair {
            self.backfill_pending().await?
        } else {
            0
        };

        let mut items = self.store.list_items(ItemKind::Product).await?;
        items.extend(self.store.list_items(ItemKind::RawMaterial).await?);

        // Pending before the log: an entry appended in between shows up once
        let pending = self.store.list_pending_movements().await?;
        let entries = self.store.list_movements().await?;
        let logged: HashSet<Uuid> = entries.iter().map(|entry| entry.id).collect();
        let pending: Vec<MovementLog> = pending
            .into_iter()
            .filter(|entry| !logged.contains(&entry.id))
            .collect();

        let discrepancies: Vec<StockDiscrepancy> = items
            .iter()
            .filter_map(|item| {
                let expected = item
                    .opening_stock
                    .saturating_add(net_change(&entries, item.item_ref()))
                    .saturating_add(net_change(&pending, item.item_ref()));
                (expected != item.stock).then(|| StockDiscrepancy {
                    item: item.item_ref(),
                    item_name: item.name.clone(),
                    recorded: item.stock,
                    expected,
                })
            })
            .collect();

        for d in &discrepancies {
            tracing::warn!(
                item = %d.item,
                recorded = d.recorded,
                expected = d.expected,
                "Stock disagrees with movement log"
            );
        }

        let repaired = repair && !discrepancies.is_empty();
        if repaired {
            let mut batch = WriteBatch::new();
            batch.extend(discrepancies.iter().map(|d| WriteOp::SetStock {
                item: d.item,
                stock: d.expected,
            }));
            self.commit_with_retry(&batch).await?;
            tracing::info!(repaired = discrepancies.len(), "Stock rebuilt from movement log");
        }

        Ok(ReconcileReport {
            items_checked: items.len(),
            unlogged_movements: pending.len(),
            backfilled,
            discrepancies,
            repaired,
        })
    }
}
