//! PostgreSQL document store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    Expense, Item, ItemKind, ItemRef, MovementContext, MovementLog, Production,
    ProductionMaterial, ProductionResult, Purchase, Revenue, Sale, SaleLine,
};
use sqlx::{types::Json, FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{DocumentStore, StockGuard, WriteBatch, WriteOp};
use crate::error::{AppError, AppResult};

/// Document store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

/// Database row for products and raw materials
#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    unit: String,
    category: Option<String>,
    price: Decimal,
    stock: i64,
    opening_stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self, kind: ItemKind) -> Item {
        Item {
            id: self.id,
            kind,
            name: self.name,
            unit: self.unit,
            category: self.category,
            price: self.price,
            stock: self.stock,
            opening_stock: self.opening_stock,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    customer: String,
    items: Json<Vec<SaleLine>>,
    platform: String,
    status: String,
    total: Decimal,
    date: NaiveDate,
    receipt_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = AppError;

    fn try_from(row: SaleRow) -> AppResult<Self> {
        Ok(Sale {
            id: row.id,
            customer: row.customer,
            items: row.items.0,
            platform: row.platform.parse().map_err(AppError::Internal)?,
            status: row.status.parse().map_err(AppError::Internal)?,
            total: row.total,
            date: row.date,
            receipt_number: row.receipt_number,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ProductionRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    date: NaiveDate,
    status: String,
    materials: Json<Vec<ProductionMaterial>>,
    product_result: Json<ProductionResult>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductionRow> for Production {
    type Error = AppError;

    fn try_from(row: ProductionRow) -> AppResult<Self> {
        Ok(Production {
            id: row.id,
            name: row.name,
            description: row.description,
            date: row.date,
            status: row.status.parse().map_err(AppError::Internal)?,
            materials: row.materials.0,
            product_result: row.product_result.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: Uuid,
    item_kind: String,
    item_id: Uuid,
    item_name: String,
    quantity: i64,
    purchase_price: Decimal,
    total_price: Decimal,
    supplier_id: Option<String>,
    supplier_name: Option<String>,
    note: Option<String>,
    date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = AppError;

    fn try_from(row: PurchaseRow) -> AppResult<Self> {
        Ok(Purchase {
            id: row.id,
            item_kind: row.item_kind.parse().map_err(AppError::Internal)?,
            item_id: row.item_id,
            item_name: row.item_name,
            quantity: row.quantity,
            purchase_price: row.purchase_price,
            total_price: row.total_price,
            supplier_id: row.supplier_id,
            supplier_name: row.supplier_name,
            note: row.note,
            date: row.date,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    item_id: Uuid,
    item_name: String,
    collection_name: String,
    quantity_change: i64,
    movement_type: String,
    timestamp: DateTime<Utc>,
    note: Option<String>,
    context: Json<MovementContext>,
}

impl TryFrom<MovementRow> for MovementLog {
    type Error = AppError;

    fn try_from(row: MovementRow) -> AppResult<Self> {
        Ok(MovementLog {
            id: row.id,
            item_id: row.item_id,
            item_name: row.item_name,
            collection_name: row.collection_name.parse().map_err(AppError::Internal)?,
            quantity_change: row.quantity_change,
            movement_type: row.movement_type.parse().map_err(AppError::Internal)?,
            timestamp: row.timestamp,
            note: row.note,
            context: row.context.0,
        })
    }
}

/// Shared row shape of the `revenues` and `expenses` tables
#[derive(Debug, FromRow)]
struct CashRow {
    id: Uuid,
    date: NaiveDate,
    category: String,
    related_id: Option<Uuid>,
    description: String,
    amount: Decimal,
}

impl From<CashRow> for Revenue {
    fn from(row: CashRow) -> Self {
        Revenue {
            id: row.id,
            date: row.date,
            category: row.category,
            related_id: row.related_id,
            description: row.description,
            amount: row.amount,
        }
    }
}

impl From<CashRow> for Expense {
    fn from(row: CashRow) -> Self {
        Expense {
            id: row.id,
            date: row.date,
            category: row.category,
            related_id: row.related_id,
            description: row.description,
            amount: row.amount,
        }
    }
}

/// Serialization failures and deadlocks are conflicts the caller may retry;
/// an out-of-range stock value is the caller's input
fn map_db_error(error: sqlx::Error) -> AppError {
    if let Some(db_error) = error.as_database_error() {
        match db_error.code().as_deref() {
            Some("40001") | Some("40P01") => {
                return AppError::TransactionConflict(db_error.message().to_string());
            }
            Some("22003") => {
                return AppError::invalid("quantity", "Stock value is out of range");
            }
            _ => {}
        }
    }
    AppError::DatabaseError(error)
}

const ITEM_COLUMNS: &str =
    "id, name, unit, category, price, stock, opening_stock, created_at, updated_at";

impl PgStore {
    /// Create a new PgStore instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn apply(&self, tx: &mut Transaction<'_, Postgres>, op: &WriteOp) -> AppResult<()> {
        match op {
            WriteOp::IncrementStock {
                item,
                item_name,
                delta,
                guard,
            } => {
                let unchecked = *guard == StockGuard::Unchecked;
                let updated = sqlx::query_scalar::<_, i64>(&format!(
                    r#"
                    UPDATE {}
                    SET stock = stock + $1, updated_at = NOW()
                    WHERE id = $2 AND ($3 OR $1 >= 0 OR stock + $1 >= 0)
                    RETURNING stock
                    "#,
                    item.kind.collection()
                ))
                .bind(delta)
                .bind(item.id)
                .bind(unchecked)
                .fetch_optional(&mut **tx)
                .await
                .map_err(map_db_error)?;

                if updated.is_none() {
                    // Either the item is gone or the guard refused the decrement
                    let current = sqlx::query_scalar::<_, i64>(&format!(
                        "SELECT stock FROM {} WHERE id = $1",
                        item.kind.collection()
                    ))
                    .bind(item.id)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(map_db_error)?;

                    return Err(match current {
                        None => AppError::ItemNotFound(*item),
                        Some(available) => AppError::InsufficientStock {
                            item_id: item.id,
                            item_name: item_name.clone(),
                            available,
                            requested: delta.saturating_neg(),
                        },
                    });
                }
            }
            WriteOp::SetStock { item, stock } => {
                let result = sqlx::query(&format!(
                    "UPDATE {} SET stock = $1, updated_at = NOW() WHERE id = $2",
                    item.kind.collection()
                ))
                .bind(stock)
                .bind(item.id)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;

                if result.rows_affected() == 0 {
                    return Err(AppError::ItemNotFound(*item));
                }
            }
            WriteOp::InsertItem(item) => {
                sqlx::query(&format!(
                    "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                    item.kind.collection(),
                    ITEM_COLUMNS
                ))
                .bind(item.id)
                .bind(&item.name)
                .bind(&item.unit)
                .bind(&item.category)
                .bind(item.price)
                .bind(item.stock)
                .bind(item.opening_stock)
                .bind(item.created_at)
                .bind(item.updated_at)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;
            }
            WriteOp::InsertSale(sale) => {
                sqlx::query(
                    r#"
                    INSERT INTO sales (id, customer, items, platform, status, total, date,
                                       receipt_number, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(sale.id)
                .bind(&sale.customer)
                .bind(Json(&sale.items))
                .bind(sale.platform.as_str())
                .bind(sale.status.as_str())
                .bind(sale.total)
                .bind(sale.date)
                .bind(&sale.receipt_number)
                .bind(sale.created_at)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;
            }
            WriteOp::UpdateSaleStatus { id, from, to } => {
                let result = sqlx::query("UPDATE sales SET status = $1 WHERE id = $2 AND status = $3")
                    .bind(to.as_str())
                    .bind(id)
                    .bind(from.as_str())
                    .execute(&mut **tx)
                    .await
                    .map_err(map_db_error)?;

                if result.rows_affected() == 0 {
                    let exists = sqlx::query_scalar::<_, bool>(
                        "SELECT EXISTS(SELECT 1 FROM sales WHERE id = $1)",
                    )
                    .bind(id)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(map_db_error)?;

                    return Err(if exists {
                        AppError::InvalidStateTransition(format!(
                            "sale {} is no longer {}",
                            id, from
                        ))
                    } else {
                        AppError::NotFound("Sale".to_string())
                    });
                }
            }
            WriteOp::DeleteSale(id) => {
                self.delete_by_id(tx, "sales", *id, "Sale").await?;
            }
            WriteOp::InsertProduction(production) => {
                sqlx::query(
                    r#"
                    INSERT INTO productions (id, name, description, date, status, materials,
                                             product_result, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(production.id)
                .bind(&production.name)
                .bind(&production.description)
                .bind(production.date)
                .bind(production.status.as_str())
                .bind(Json(&production.materials))
                .bind(Json(&production.product_result))
                .bind(production.created_at)
                .bind(production.updated_at)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;
            }
            WriteOp::ReplaceProduction {
                production,
                previous_update,
            } => {
                let result = sqlx::query(
                    r#"
                    UPDATE productions
                    SET name = $2, description = $3, date = $4, status = $5, materials = $6,
                        product_result = $7, updated_at = $8
                    WHERE id = $1 AND updated_at = $9
                    "#,
                )
                .bind(production.id)
                .bind(&production.name)
                .bind(&production.description)
                .bind(production.date)
                .bind(production.status.as_str())
                .bind(Json(&production.materials))
                .bind(Json(&production.product_result))
                .bind(production.updated_at)
                .bind(previous_update)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;

                if result.rows_affected() == 0 {
                    return Err(match self.production_exists(tx, production.id).await? {
                        true => AppError::TransactionConflict(format!(
                            "production {} changed concurrently",
                            production.id
                        )),
                        false => AppError::NotFound("Production".to_string()),
                    });
                }
            }
            WriteOp::UpdateProductionStatus { id, status } => {
                let result = sqlx::query(
                    "UPDATE productions SET status = $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(status.as_str())
                .bind(id)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;

                if result.rows_affected() == 0 {
                    return Err(AppError::NotFound("Production".to_string()));
                }
            }
            WriteOp::DeleteProduction(id) => {
                self.delete_by_id(tx, "productions", *id, "Production").await?;
            }
            WriteOp::InsertPurchase(purchase) => {
                sqlx::query(
                    r#"
                    INSERT INTO purchases (id, item_kind, item_id, item_name, quantity,
                                           purchase_price, total_price, supplier_id,
                                           supplier_name, note, date, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                    "#,
                )
                .bind(purchase.id)
                .bind(purchase.item_kind.collection())
                .bind(purchase.item_id)
                .bind(&purchase.item_name)
                .bind(purchase.quantity)
                .bind(purchase.purchase_price)
                .bind(purchase.total_price)
                .bind(&purchase.supplier_id)
                .bind(&purchase.supplier_name)
                .bind(&purchase.note)
                .bind(purchase.date)
                .bind(purchase.created_at)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;
            }
            WriteOp::DeletePurchase(id) => {
                self.delete_by_id(tx, "purchases", *id, "Purchase").await?;
            }
            WriteOp::InsertReturn(ret) => {
                sqlx::query(
                    r#"
                    INSERT INTO returns (id, item_kind, item_id, item_name, quantity, note,
                                         date, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(ret.id)
                .bind(ret.item_kind.collection())
                .bind(ret.item_id)
                .bind(&ret.item_name)
                .bind(ret.quantity)
                .bind(&ret.note)
                .bind(ret.date)
                .bind(ret.created_at)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;
            }
            WriteOp::InsertAdjustment(adjustment) => {
                sqlx::query(
                    r#"
                    INSERT INTO stock_adjustments (id, item_kind, item_id, item_name,
                                                   adjustment_type, amount, delta, reason,
                                                   created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(adjustment.id)
                .bind(adjustment.collection_name.collection())
                .bind(adjustment.item_id)
                .bind(&adjustment.item_name)
                .bind(adjustment.adjustment_type.as_str())
                .bind(adjustment.amount)
                .bind(adjustment.delta)
                .bind(&adjustment.reason)
                .bind(adjustment.created_at)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;
            }
            WriteOp::InsertRevenue(revenue) => {
                self.insert_cash(
                    tx,
                    "revenues",
                    revenue.id,
                    revenue.date,
                    &revenue.category,
                    revenue.related_id,
                    &revenue.description,
                    revenue.amount,
                )
                .await?;
            }
            WriteOp::DeleteRevenuesFor(related_id) => {
                sqlx::query("DELETE FROM revenues WHERE related_id = $1")
                    .bind(related_id)
                    .execute(&mut **tx)
                    .await
                    .map_err(map_db_error)?;
            }
            WriteOp::InsertExpense(expense) => {
                self.insert_cash(
                    tx,
                    "expenses",
                    expense.id,
                    expense.date,
                    &expense.category,
                    expense.related_id,
                    &expense.description,
                    expense.amount,
                )
                .await?;
            }
            WriteOp::DeleteExpensesFor(related_id) => {
                sqlx::query("DELETE FROM expenses WHERE related_id = $1")
                    .bind(related_id)
                    .execute(&mut **tx)
                    .await
                    .map_err(map_db_error)?;
            }
            WriteOp::AppendMovement(entry) => {
                Self::insert_movement(tx, entry).await?;
            }
            WriteOp::QueueMovement(entry) => {
                sqlx::query(
                    "INSERT INTO pending_movements (id, entry) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                )
                .bind(entry.id)
                .bind(Json(entry))
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;
            }
            WriteOp::ClaimEvent(event_id) => {
                let result = sqlx::query(
                    "INSERT INTO processed_events (event_id) VALUES ($1) ON CONFLICT DO NOTHING",
                )
                .bind(event_id)
                .execute(&mut **tx)
                .await
                .map_err(map_db_error)?;

                if result.rows_affected() == 0 {
                    return Err(AppError::DuplicateEvent(event_id.clone()));
                }
            }
        }
        Ok(())
    }

    async fn production_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM productions WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut **tx)
                .await
                .map_err(map_db_error)?;
        Ok(exists)
    }

    async fn delete_by_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        table: &str,
        id: Uuid,
        resource: &str,
    ) -> AppResult<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(resource.to_string()));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_cash(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        table: &str,
        id: Uuid,
        date: NaiveDate,
        category: &str,
        related_id: Option<Uuid>,
        description: &str,
        amount: Decimal,
    ) -> AppResult<()> {
        sqlx::query(&format!(
            "INSERT INTO {} (id, date, category, related_id, description, amount) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            table
        ))
        .bind(id)
        .bind(date)
        .bind(category)
        .bind(related_id)
        .bind(description)
        .bind(amount)
        .execute(&mut **tx)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn insert_movement(
        tx: &mut Transaction<'_, Postgres>,
        entry: &MovementLog,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_logs (id, item_id, item_name, collection_name,
                                        quantity_change, movement_type, timestamp, note, context)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(entry.id)
        .bind(entry.item_id)
        .bind(&entry.item_name)
        .bind(entry.collection_name.collection())
        .bind(entry.quantity_change)
        .bind(entry.movement_type.as_str())
        .bind(entry.timestamp)
        .bind(&entry.note)
        .bind(Json(&entry.context))
        .execute(&mut **tx)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get_item(&self, item: ItemRef) -> AppResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            ITEM_COLUMNS,
            item.kind.collection()
        ))
        .bind(item.id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|r| r.into_item(item.kind)))
    }

    async fn list_items(&self, kind: ItemKind) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM {} ORDER BY name ASC",
            ITEM_COLUMNS,
            kind.collection()
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_item(kind)).collect())
    }

    async fn get_sale(&self, id: Uuid) -> AppResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, customer, items, platform, status, total, date, receipt_number, created_at
            FROM sales
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Sale::try_from).transpose()
    }

    async fn get_production(&self, id: Uuid) -> AppResult<Option<Production>> {
        let row = sqlx::query_as::<_, ProductionRow>(
            r#"
            SELECT id, name, description, date, status, materials, product_result,
                   created_at, updated_at
            FROM productions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Production::try_from).transpose()
    }

    async fn get_purchase(&self, id: Uuid) -> AppResult<Option<Purchase>> {
        let row = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, item_kind, item_id, item_name, quantity, purchase_price, total_price,
                   supplier_id, supplier_name, note, date, created_at
            FROM purchases
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Purchase::try_from).transpose()
    }

    async fn list_revenues(&self) -> AppResult<Vec<Revenue>> {
        let rows = sqlx::query_as::<_, CashRow>(
            r#"
            SELECT id, date, category, related_id, description, amount
            FROM revenues
            ORDER BY date DESC, seq DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Revenue::from).collect())
    }

    async fn list_expenses(&self) -> AppResult<Vec<Expense>> {
        let rows = sqlx::query_as::<_, CashRow>(
            r#"
            SELECT id, date, category, related_id, description, amount
            FROM expenses
            ORDER BY date DESC, seq DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Expense::from).collect())
    }

    async fn list_movements(&self) -> AppResult<Vec<MovementLog>> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, item_id, item_name, collection_name, quantity_change, movement_type,
                   timestamp, note, context
            FROM inventory_logs
            ORDER BY timestamp DESC, seq DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(MovementLog::try_from).collect()
    }

    async fn append_movements(&self, entries: &[MovementLog]) -> AppResult<()> {
        let mut tx = self.db.begin().await.map_err(map_db_error)?;
        for entry in entries {
            Self::insert_movement(&mut tx, entry).await?;
        }
        let ids: Vec<Uuid> = entries.iter().map(|entry| entry.id).collect();
        sqlx::query("DELETE FROM pending_movements WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    async fn list_pending_movements(&self) -> AppResult<Vec<MovementLog>> {
        let rows = sqlx::query_scalar::<_, Json<MovementLog>>(
            "SELECT entry FROM pending_movements ORDER BY seq",
        )
        .fetch_all(&self.db)
        .await
        .map_err(map_db_error)?;
        Ok(rows.into_iter().map(|Json(entry)| entry).collect())
    }

    async fn commit(&self, batch: &WriteBatch) -> AppResult<()> {
        let mut tx = self.db.begin().await.map_err(map_db_error)?;
        for op in batch.ops() {
            self.apply(&mut tx, op).await?;
        }
        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
