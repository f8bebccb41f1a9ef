//! HTTP handlers for productions

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use shared::{Production, ProductionStatus};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::production::{ProductionInput, ProductionService};
use crate::services::Recorded;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProductionStatusInput {
    pub status: ProductionStatus,
}

/// Create a production
pub async fn create_production(
    State(state): State<AppState>,
    Json(input): Json<ProductionInput>,
) -> AppResult<Json<Recorded<Production>>> {
    let service = ProductionService::new(state.ledger());
    let production = service.create(input).await?;
    Ok(Json(production))
}

/// Get a production
pub async fn get_production(
    State(state): State<AppState>,
    Path(production_id): Path<Uuid>,
) -> AppResult<Json<Production>> {
    let service = ProductionService::new(state.ledger());
    let production = service.get(production_id).await?;
    Ok(Json(production))
}

/// Replace a production's materials and result
pub async fn update_production(
    State(state): State<AppState>,
    Path(production_id): Path<Uuid>,
    Json(input): Json<ProductionInput>,
) -> AppResult<Json<Recorded<Production>>> {
    let service = ProductionService::new(state.ledger());
    let production = service.edit(production_id, input).await?;
    Ok(Json(production))
}

/// Delete a production and reverse its stock effects
pub async fn delete_production(
    State(state): State<AppState>,
    Path(production_id): Path<Uuid>,
) -> AppResult<Json<Recorded<Production>>> {
    let service = ProductionService::new(state.ledger());
    let production = service.delete(production_id).await?;
    Ok(Json(production))
}

/// Set a production's status label
pub async fn update_production_status(
    State(state): State<AppState>,
    Path(production_id): Path<Uuid>,
    Json(input): Json<UpdateProductionStatusInput>,
) -> AppResult<Json<Production>> {
    let service = ProductionService::new(state.ledger());
    let production = service.set_status(production_id, input.status).await?;
    Ok(Json(production))
}
