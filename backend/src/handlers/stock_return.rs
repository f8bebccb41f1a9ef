//! HTTP handlers for returns

use axum::{extract::State, Json};
use shared::StockReturn;

use crate::error::AppResult;
use crate::services::stock_return::{CreateReturnInput, ReturnService};
use crate::services::Recorded;
use crate::AppState;

/// Record items returned to inventory
pub async fn create_return(
    State(state): State<AppState>,
    Json(input): Json<CreateReturnInput>,
) -> AppResult<Json<Recorded<StockReturn>>> {
    let service = ReturnService::new(state.ledger());
    let ret = service.create_return(input).await?;
    Ok(Json(ret))
}
