//! Production converter
//!
//! A production consumes raw materials and yields one finished product. Stock
//! effects are applied when the production is saved; its status is metadata.
//! Edits post the reversal of the stored effect and the new effect in the
//! same batch, deletes post only the reversal, so stock never reflects half
//! of a production.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared::{
    ComponentInput, ItemRef, MovementContext, Production, ProductionMaterial, ProductionResult,
    ProductionStatus, StockEffect,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{AuditMode, LedgerBatch, LedgerService, Recorded};
use crate::store::{WriteBatch, WriteOp};

/// Input for creating or editing a production
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductionInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: ProductionStatus,
    #[validate(length(min = 1))]
    pub materials: Vec<ComponentInput>,
    pub product_result: ComponentInput,
}

impl ProductionInput {
    fn check(&self) -> AppResult<()> {
        self.validate()?;
        for component in self.materials.iter().chain(std::iter::once(&self.product_result)) {
            component.validate()?;
        }
        Ok(())
    }
}

/// Production service
#[derive(Clone)]
pub struct ProductionService {
    ledger: LedgerService,
}

impl ProductionService {
    /// Create a new ProductionService instance
    pub fn new(ledger: LedgerService) -> Self {
        Self { ledger }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Production> {
        self.ledger
            .store()
            .get_production(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Production".to_string()))
    }

    /// Save a new production and apply its stock effects
    pub async fn create(&self, input: ProductionInput) -> AppResult<Recorded<Production>> {
        input.check()?;
        let (materials, product_result) = self.resolve_components(&input).await?;

        let now = Utc::now();
        let production = Production {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            date: input.date,
            status: input.status,
            materials,
            product_result,
            created_at: now,
            updated_at: now,
        };

        let mut batch = LedgerBatch::new();
        batch.write(WriteOp::InsertProduction(production.clone()));
        post_all(&mut batch, production.effects(), production.id);

        let recorded = self.ledger.commit(batch, AuditMode::FollowUp).await?;
        tracing::info!(production_id = %production.id, "Production created");
        Ok(recorded.map(|_| production))
    }

    /// Replace a production's materials and result, moving stock by the difference
    pub async fn edit(&self, id: Uuid, input: ProductionInput) -> AppResult<Recorded<Production>> {
        input.check()?;
        let old = self.get(id).await?;
        let (materials, product_result) = self.resolve_components(&input).await?;

        let updated = Production {
            id: old.id,
            name: input.name,
            description: input.description,
            date: input.date,
            status: input.status,
            materials,
            product_result,
            created_at: old.created_at,
            updated_at: Utc::now(),
        };

        let mut batch = LedgerBatch::new();
        batch.write(WriteOp::ReplaceProduction {
            production: updated.clone(),
            previous_update: old.updated_at,
        });
        post_all(&mut batch, old.reversal_effects(), id);
        post_all(&mut batch, updated.effects(), id);

        let recorded = self.ledger.commit(batch, AuditMode::FollowUp).await?;
        tracing::info!(production_id = %id, "Production edited");
        Ok(recorded.map(|_| updated))
    }

    /// Remove a production and reverse its stock effects exactly
    pub async fn delete(&self, id: Uuid) -> AppResult<Recorded<Production>> {
        let production = self.get(id).await?;

        let mut batch = LedgerBatch::new();
        batch.write(WriteOp::DeleteProduction(id));
        post_all(&mut batch, production.reversal_effects(), id);

        let recorded = self.ledger.commit(batch, AuditMode::FollowUp).await?;
        tracing::info!(production_id = %id, "Production deleted");
        Ok(recorded.map(|_| production))
    }

    /// Change the status label without touching stock
    pub async fn set_status(&self, id: Uuid, status: ProductionStatus) -> AppResult<Production> {
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateProductionStatus { id, status });
        self.ledger.commit_with_retry(&batch).await?;

        tracing::info!(production_id = %id, status = status.as_str(), "Production status set");
        self.get(id).await
    }

    async fn resolve_components(
        &self,
        input: &ProductionInput,
    ) -> AppResult<(Vec<ProductionMaterial>, ProductionResult)> {
        let mut materials = Vec::with_capacity(input.materials.len());
        for component in &input.materials {
            let item = self
                .ledger
                .resolve(ItemRef::raw_material(component.item_id))
                .await?;
            materials.push(ProductionMaterial {
                material_id: item.id,
                name: item.name,
                quantity: component.quantity,
            });
        }

        let product = self
            .ledger
            .resolve(ItemRef::product(input.product_result.item_id))
            .await?;

        Ok((
            materials,
            ProductionResult {
                product_id: product.id,
                name: product.name,
                quantity: input.product_result.quantity,
            },
        ))
    }
}

fn post_all(batch: &mut LedgerBatch, effects: Vec<StockEffect>, production_id: Uuid) {
    for effect in effects {
        batch.post(
            effect,
            None,
            MovementContext {
                production_id: Some(production_id),
                ..Default::default()
            },
        );
    }
}
