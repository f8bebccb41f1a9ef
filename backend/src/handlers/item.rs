//! HTTP handlers for item master data

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::{Item, ItemKind, ItemRef, MovementLog};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::item::{CreateItemInput, ItemService, LowStockReport};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub kind: ItemKind,
}

/// Create a product or raw material
pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.ledger());
    let item = service.create_item(input).await?;
    Ok(Json(item))
}

/// List the items of one kind
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<Item>>> {
    let service = ItemService::new(state.ledger());
    let items = service.list_items(query.kind).await?;
    Ok(Json(items))
}

/// Get one item
pub async fn get_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(ItemKind, Uuid)>,
) -> AppResult<Json<Item>> {
    let service = ItemService::new(state.ledger());
    let item = service.get_item(ItemRef::new(kind, id)).await?;
    Ok(Json(item))
}

/// Items at or below their low-stock threshold
pub async fn low_stock(State(state): State<AppState>) -> AppResult<Json<LowStockReport>> {
    let service = ItemService::new(state.ledger());
    let report = service.low_stock(&state.config.inventory).await?;
    Ok(Json(report))
}

/// Movement history of one item, newest first
pub async fn item_movements(
    State(state): State<AppState>,
    Path((kind, id)): Path<(ItemKind, Uuid)>,
) -> AppResult<Json<Vec<MovementLog>>> {
    let ledger = state.ledger();
    let item = ItemRef::new(kind, id);
    ledger.resolve(item).await?;
    let movements = ledger.movements_for(item).await?;
    Ok(Json(movements))
}
