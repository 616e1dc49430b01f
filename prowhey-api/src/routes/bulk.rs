//! `POST /api/stock/update-all`, `POST /api/price/update-all` (spec.md §6).
//!
//! Both trigger a scoped [`SyncProcessor::sync_entity_type`] refresh and
//! translate its [`SyncSummary`] into the bulk-ops response shape.

use axum::{extract::State, routing::post, Json, Router};
use prowhey_core::EntityType;
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BulkUpdateResponse {
    pub total_fetched: usize,
    pub with_variants: usize,
    pub processed: usize,
    pub updated: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

async fn run(state: &AppState, entity_type: EntityType) -> ApiResult<Json<BulkUpdateResponse>> {
    let summary = state.sync_processor.sync_entity_type(entity_type).await?;
    let processed = summary.created + summary.updated + summary.unchanged;
    Ok(Json(BulkUpdateResponse {
        total_fetched: processed + summary.deleted,
        // Variant-bearing records are a `product`-only concept (spec.md
        // §3's ProductPayload); stock/price refreshes never have any.
        with_variants: 0,
        processed,
        updated: summary.updated,
        failed: 0,
        errors: Vec::new(),
    }))
}

pub async fn update_all_stock(State(state): State<AppState>) -> ApiResult<Json<BulkUpdateResponse>> {
    run(&state, EntityType::Stock).await
}

pub async fn update_all_price(State(state): State<AppState>) -> ApiResult<Json<BulkUpdateResponse>> {
    run(&state, EntityType::Price).await
}

pub fn stock_router() -> Router<AppState> {
    Router::new().route("/update-all", post(update_all_stock))
}

pub fn price_router() -> Router<AppState> {
    Router::new().route("/update-all", post(update_all_price))
}
