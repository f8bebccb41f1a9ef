//! HTTP handlers for purchases

use axum::{
    extract::{Path, State},
    Json,
};
use shared::Purchase;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::purchase::{CreatePurchaseInput, PurchaseService};
use crate::services::Recorded;
use crate::AppState;

/// Record a purchase
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(input): Json<CreatePurchaseInput>,
) -> AppResult<Json<Recorded<Purchase>>> {
    let service = PurchaseService::new(state.ledger());
    let purchase = service.create_purchase(input).await?;
    Ok(Json(purchase))
}

/// Get a purchase
pub async fn get_purchase(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<Purchase>> {
    let service = PurchaseService::new(state.ledger());
    let purchase = service.get(purchase_id).await?;
    Ok(Json(purchase))
}

/// Delete a purchase and reverse its effects
pub async fn delete_purchase(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<Purchase>> {
    let service = PurchaseService::new(state.ledger());
    let purchase = service.delete_purchase(purchase_id).await?;
    Ok(Json(purchase))
}
