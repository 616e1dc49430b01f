//! `GET /api/resource/<Doctype>` read-through (spec.md §4.6, §6).
//!
//! A `filters=[["name","=",<id>]]` query resolves a single cached entity
//! (triggering read-through ingest on a miss); anything else is treated as
//! a generic filtered listing and cached under a digest of the raw query
//! string.

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    extract::{Path, Query, RawQuery, State},
    routing::get,
    Json, Router,
};
use prowhey_core::{EntityId, EntityType};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const QUERY_CACHE_TTL_SECONDS: u64 = 300;

pub async fn get_resource(
    State(state): State<AppState>,
    Path(doctype): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    RawQuery(raw_query): RawQuery,
) -> ApiResult<Json<Value>> {
    let entity_type = EntityType::from_str(&doctype.to_lowercase())
        .map_err(|e| ApiError::not_found(e.to_string()))?;

    if let Some(id) = single_entity_filter(&params) {
        return get_single(&state, entity_type, &id).await;
    }
    get_query(&state, entity_type, &raw_query.unwrap_or_default()).await
}

/// Recognizes the `filters=[["name","=",<id>]]` shape the app uses for a
/// single-entity lookup; anything else falls through to the generic
/// filtered-query path.
fn single_entity_filter(params: &HashMap<String, String>) -> Option<String> {
    let filters: Value = serde_json::from_str(params.get("filters")?).ok()?;
    let clauses = filters.as_array()?;
    if clauses.len() != 1 {
        return None;
    }
    let clause = clauses[0].as_array()?;
    if clause.len() != 3 {
        return None;
    }
    if clause[0].as_str()? != "name" || clause[1].as_str()? != "=" {
        return None;
    }
    clause[2].as_str().map(str::to_string)
}

async fn get_single(state: &AppState, entity_type: EntityType, entity_id: &str) -> ApiResult<Json<Value>> {
    let cached = match state.cache.get(entity_type, &EntityId::new(entity_id.to_string())).await? {
        Some(cached) if !cached.is_tombstone() => Some(cached),
        Some(_) => None,
        None => {
            state
                .sync_processor
                .sync_one(entity_type, entity_id, None)
                .await?;
            state.cache.get(entity_type, &EntityId::new(entity_id.to_string())).await?
        }
    };
    let cached = cached.ok_or_else(|| ApiError::not_found(format!("{entity_type} {entity_id} not found")))?;
    Ok(Json(serde_json::json!({ "data": cached.payload })))
}

async fn get_query(state: &AppState, entity_type: EntityType, query: &str) -> ApiResult<Json<Value>> {
    let digest = hex::encode(Sha256::digest(query.as_bytes()));
    let cache_key = format!("cache:{}:query:{digest}", entity_type.as_str());

    if let Some(cached) = state.store.get(&cache_key).await? {
        let value: Value = serde_json::from_str(&cached).map_err(|e| ApiError::internal(e.to_string()))?;
        return Ok(Json(value));
    }

    // No index to evaluate the filter against; refresh the type and
    // return everything the cache currently holds for it.
    state.sync_processor.sync_entity_type(entity_type).await?;
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
    let response = serde_json::json!({ "data": items });
    state
        .store
        .set_ex(&cache_key, &response.to_string(), QUERY_CACHE_TTL_SECONDS)
        .await?;
    Ok(Json(response))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:doctype", get(get_resource))
}
