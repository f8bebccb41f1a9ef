//! Route definitions for the Stock Ledger API

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/items", item_routes())
        .route("/movements", get(handlers::list_movements))
        .nest("/stock", stock_routes())
        .route("/ledger/reconcile", post(handlers::reconcile))
        .route("/ledger/backfill", post(handlers::backfill_movements))
        .nest("/sales", sale_routes())
        .nest("/purchases", purchase_routes())
        .route("/returns", post(handlers::create_return))
        .nest("/productions", production_routes())
        .nest("/finance", finance_routes())
        // Change feed deliveries from the document store
        .route("/events", post(handlers::receive_stock_event))
}

/// Item master data routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/low-stock", get(handlers::low_stock))
        .route("/:kind/:id", get(handlers::get_item))
        .route("/:kind/:id/movements", get(handlers::item_movements))
}

/// Manual stock movement routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/adjust", post(handlers::adjust_stock))
        .route("/in", post(handlers::stock_in))
        .route("/out", post(handlers::stock_out))
}

/// Sale routes
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_sale))
        .route(
            "/:sale_id",
            get(handlers::get_sale).delete(handlers::delete_sale),
        )
        .route("/:sale_id/status", put(handlers::update_sale_status))
}

/// Purchase routes
fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_purchase))
        .route(
            "/:purchase_id",
            get(handlers::get_purchase).delete(handlers::delete_purchase),
        )
}

/// Production routes
fn production_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_production))
        .route(
            "/:production_id",
            get(handlers::get_production)
                .put(handlers::update_production)
                .delete(handlers::delete_production),
        )
        .route(
            "/:production_id/status",
            put(handlers::update_production_status),
        )
}

/// Finance routes
fn finance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/revenues",
            get(handlers::list_revenues).post(handlers::record_revenue),
        )
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::record_expense),
        )
        .route("/summary", get(handlers::summary))
}
