//! HTTP handlers for manual stock movements

use axum::{extract::State, Json};
use shared::{MovementLog, StockAdjustment};

use crate::error::AppResult;
use crate::services::adjustment::{AdjustStockInput, AdjustmentService, StockInInput, StockOutInput};
use crate::services::Recorded;
use crate::AppState;

/// Apply a manual adjustment
pub async fn adjust_stock(
    State(state): State<AppState>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<Recorded<StockAdjustment>>> {
    let service = AdjustmentService::new(state.ledger());
    let adjustment = service.adjust(input).await?;
    Ok(Json(adjustment))
}

/// Receive stock
pub async fn stock_in(
    State(state): State<AppState>,
    Json(input): Json<StockInInput>,
) -> AppResult<Json<Recorded<MovementLog>>> {
    let service = AdjustmentService::new(state.ledger());
    let movement = service.stock_in(input).await?;
    Ok(Json(movement))
}

/// Release stock
pub async fn stock_out(
    State(state): State<AppState>,
    Json(input): Json<StockOutInput>,
) -> AppResult<Json<Recorded<MovementLog>>> {
    let service = AdjustmentService::new(state.ledger());
    let movement = service.stock_out(input).await?;
    Ok(Json(movement))
}
