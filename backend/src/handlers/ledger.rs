//! HTTP handlers for the movement log and stock reconciliation

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::MovementLog;

use crate::error::AppResult;
use crate::services::ledger::ReconcileReport;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BackfillResponse {
    pub backfilled: usize,
}

#[derive(Debug, Deserialize)]
pub struct ReconcileQuery {
    #[serde(default)]
    pub repair: bool,
}

/// All movements, newest first
pub async fn list_movements(State(state): State<AppState>) -> AppResult<Json<Vec<MovementLog>>> {
    let movements = state.ledger().list_movements().await?;
    Ok(Json(movements))
}

/// Compare cached stock with the movement log, optionally rewriting it
pub async fn reconcile(
    State(state): State<AppState>,
    Query(query): Query<ReconcileQuery>,
) -> AppResult<Json<ReconcileReport>> {
    let report = state.ledger().reconcile(query.repair).await?;
    Ok(Json(report))
}

/// Move movement entries left pending by degraded commits into the log
pub async fn backfill_movements(State(state): State<AppState>) -> AppResult<Json<BackfillResponse>> {
    let backfilled = state.ledger().backfill_pending().await?;
    Ok(Json(BackfillResponse { backfilled }))
}
