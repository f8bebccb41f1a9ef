//! HTTP handlers for sales

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use shared::{Sale, SaleStatus};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::sale::{CreateSaleInput, SaleService};
use crate::services::Recorded;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateSaleStatusInput {
    pub status: SaleStatus,
}

/// Record a sale
pub async fn create_sale(
    State(state): State<AppState>,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<Recorded<Sale>>> {
    let service = SaleService::new(state.ledger());
    let sale = service.create_sale(input).await?;
    Ok(Json(sale))
}

/// Get a sale
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let service = SaleService::new(state.ledger());
    let sale = service.get(sale_id).await?;
    Ok(Json(sale))
}

/// Move a sale to another status
pub async fn update_sale_status(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
    Json(input): Json<UpdateSaleStatusInput>,
) -> AppResult<Json<Sale>> {
    let service = SaleService::new(state.ledger());
    let sale = service.transition_status(sale_id, input.status).await?;
    Ok(Json(sale))
}

/// Delete a sale and reverse its effects
pub async fn delete_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let service = SaleService::new(state.ledger());
    let sale = service.delete_sale(sale_id).await?;
    Ok(Json(sale))
}
