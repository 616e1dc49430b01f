//! `GET /api/hero | /api/bundle | /api/home` (spec.md §6).
//!
//! `hero` and `bundle` are collections — the ERP publishes many banner and
//! bundle entries, each its own cached entity — while `home` is a true
//! singleton (spec.md §3's `HomePayload`), read through under a fixed id.

use axum::{extract::State, routing::get, Json, Router};
use prowhey_core::{EntityId, EntityType};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const HOME_SINGLETON_ID: &str = "singleton";

async fn collection(state: &AppState, entity_type: EntityType) -> ApiResult<Json<Value>> {
    let prefix = format!("hash:{}:", entity_type.as_str());
    let keys = state.store.scan_keys(&format!("{prefix}*")).await?;
    let mut items = Vec::with_capacity(keys.len());
    for key in keys {
        let Some(id) = key.strip_prefix(&prefix) else { continue };
        if let Some(cached) = state.cache.get(entity_type, &EntityId::new(id.to_string())).await? {
            if !cached.is_tombstone() {
                items.push(cached.payload);
            }
        }
    }
    Ok(Json(serde_json::json!({ "data": items })))
}

pub async fn hero(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    collection(&state, EntityType::Hero).await
}

pub async fn bundle(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    collection(&state, EntityType::Bundle).await
}

pub async fn home(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let id = EntityId::new(HOME_SINGLETON_ID);
    let cached = match state.cache.get(EntityType::Home, &id).await? {
        Some(cached) if !cached.is_tombstone() => Some(cached),
        _ => {
            state.sync_processor.sync_one(EntityType::Home, HOME_SINGLETON_ID, None).await?;
            state.cache.get(EntityType::Home, &id).await?
        }
    };
    let cached = cached.ok_or_else(|| ApiError::not_found("home collection not found"))?;
    Ok(Json(serde_json::json!({ "data": cached.payload })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hero", get(hero))
        .route("/bundle", get(bundle))
        .route("/home", get(home))
}
