//! HTTP handler receiving stock events from the store's change feed

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::trigger::{StockEvent, StockEventProcessor, TriggerOutcome};
use crate::AppState;

/// Apply one delivered stock event; redeliveries are acknowledged without effect
pub async fn receive_stock_event(
    State(state): State<AppState>,
    Json(event): Json<StockEvent>,
) -> AppResult<Json<TriggerOutcome>> {
    let processor = StockEventProcessor::new(state.ledger());
    let outcome = processor.process(event).await?;
    Ok(Json(outcome))
}
