//! Incremental sync protocol (spec.md §4.7, §6): `POST /api/sync/check`
//! and its fixed-tier variants.

use std::collections::HashMap;

use axum::{extract::State, routing::post, Json, Router};
use prowhey_core::{CallerContext, Cursor, EntityId, EntityType, JournalId};
use prowhey_store::AudienceFilter;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Default and max batch size per journal (spec.md §4.7).
const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub last_sync: Cursor,
    #[serde(default)]
    pub entity_types: Option<Vec<EntityType>>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_groups: Vec<String>,
    #[serde(default)]
    pub user_region: Option<String>,
    #[serde(default)]
    pub user_province: Option<String>,
    #[serde(default)]
    pub user_city: Option<String>,
    #[serde(default)]
    pub user_device_id: Option<String>,
    #[serde(default)]
    pub is_registered: bool,
}

impl SyncRequest {
    fn caller(&self) -> CallerContext {
        CallerContext {
            user_id: self.user_id.clone(),
            user_groups: self.user_groups.clone(),
            user_region: self.user_region.clone(),
            user_province: self.user_province.clone(),
            user_city: self.user_city.clone(),
            user_device_id: self.user_device_id.clone(),
            is_registered: self.is_registered,
        }
    }

    fn resolve_limit(&self) -> ApiResult<usize> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit < 1 || limit > MAX_LIMIT {
            return Err(ApiError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        Ok(limit)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncResponse {
    pub in_sync: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<Value>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub last_ids: HashMap<EntityType, JournalId>,
}

impl SyncResponse {
    fn in_sync() -> Self {
        Self {
            in_sync: true,
            updates: Vec::new(),
            last_ids: HashMap::new(),
        }
    }
}

pub async fn check(State(state): State<AppState>, Json(body): Json<SyncRequest>) -> ApiResult<Json<SyncResponse>> {
    run_sync(&state, &body, None).await
}

pub async fn check_fast(State(state): State<AppState>, Json(body): Json<SyncRequest>) -> ApiResult<Json<SyncResponse>> {
    run_sync(&state, &body, Some(&EntityType::FAST_TIER)).await
}

pub async fn check_medium(State(state): State<AppState>, Json(body): Json<SyncRequest>) -> ApiResult<Json<SyncResponse>> {
    run_sync(&state, &body, Some(&EntityType::MEDIUM_TIER)).await
}

pub async fn check_slow(State(state): State<AppState>, Json(body): Json<SyncRequest>) -> ApiResult<Json<SyncResponse>> {
    run_sync(&state, &body, Some(&EntityType::SLOW_TIER)).await
}

/// spec.md §4.7 steps 1-7. `fixed_tier` overrides `entity_types` for the
/// tier-scoped endpoints.
async fn run_sync(
    state: &AppState,
    body: &SyncRequest,
    fixed_tier: Option<&[EntityType]>,
) -> ApiResult<Json<SyncResponse>> {
    let limit = body.resolve_limit()?;
    let caller = body.caller();

    let types: Vec<EntityType> = match fixed_tier {
        Some(tier) => tier.to_vec(),
        None => match &body.entity_types {
            Some(types) => types.clone(),
            None => body.last_sync.keys().copied().collect(),
        },
    };
    if types.is_empty() {
        return Ok(Json(SyncResponse::in_sync()));
    }

    let mut updates = Vec::new();
    let mut last_ids: HashMap<EntityType, JournalId> = HashMap::new();

    for entity_type in types {
        let cursor = body.last_sync.get(&entity_type).copied().unwrap_or(JournalId::ZERO);
        let batch = state.journal.read_since(entity_type, cursor).await?;
        let batch: Vec<_> = batch.into_iter().take(limit).collect();

        // Step 4: dedup survivors to the latest entry per entity_id —
        // several entries for the same id in one batch only need to
        // surface once, as the freshest cache payload already subsumes
        // the earlier ones.
        let mut surviving: HashMap<String, JournalId> = HashMap::new();
        let mut idempotency_keys: HashMap<String, Option<String>> = HashMap::new();

        for (id, entry) in &batch {
            // Step 3: Audience Filter applies only to the two scoped
            // types; everything else passes straight through. A scoped
            // entry with no recoverable target (filter evaluation
            // error, or audience info lost) fails safe to excluded.
            let admitted = if entity_type.is_audience_scoped() {
                match &entry.target {
                    Some(target) => AudienceFilter::admits_notification(target, &caller),
                    None => false,
                }
            } else {
                true
            };

            if admitted {
                surviving.insert(entry.entity_id.clone(), *id);
                idempotency_keys.insert(entry.entity_id.clone(), entry.idempotency_key.clone());
            }
            // Steps 5 & 6 collapse into one assignment: whether or not
            // this entry survived the filter, the cursor still advances
            // past it, so the client never re-reads a no-op or
            // filtered-out entry.
            last_ids.insert(entity_type, *id);
        }

        for (entity_id, _) in surviving {
            if let Some(cached) = state.cache.get(entity_type, &EntityId::new(entity_id.clone())).await? {
                let idempotency_key = idempotency_keys.remove(&entity_id).flatten();
                updates.push(build_update(entity_type, &cached, idempotency_key));
            }
        }
    }

    // Step 7: `inSync` reflects whether any update survived, but `lastIds`
    // is returned either way — step 6 requires the cursor to advance past
    // filtered/no-op batches even when there is nothing to deliver, so the
    // client never re-reads the same dead entries next call.
    Ok(Json(SyncResponse {
        in_sync: updates.is_empty(),
        updates,
        last_ids,
    }))
}

fn build_update(entity_type: EntityType, cached: &prowhey_core::CachedEntity, idempotency_key: Option<String>) -> Value {
    serde_json::json!({
        "entity_type": entity_type,
        "entity_id": cached.entity_id,
        "version": cached.version,
        "data_hash": cached.data_hash,
        "deleted": cached.is_tombstone(),
        "payload": cached.payload,
        "idempotency_key": idempotency_key,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check", post(check))
        .route("/check-fast", post(check_fast))
        .route("/check-medium", post(check_medium))
        .route("/check-slow", post(check_slow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prowhey_core::{EntityPayload, JournalEntry, StockPayload, TargetSet};
    use prowhey_ingest::{ErpClient, IngestResult, RawRecord};
    use prowhey_store::{ChangeJournal, InMemoryStore, TransformedCache};
    use std::sync::Arc;

    struct NullErpClient;

    #[async_trait]
    impl ErpClient for NullErpClient {
        async fn fetch_all(&self, _entity_type: EntityType) -> IngestResult<Vec<RawRecord>> {
            Ok(Vec::new())
        }
        async fn fetch_one(&self, _entity_type: EntityType, _entity_id: &str) -> IngestResult<Option<RawRecord>> {
            Ok(None)
        }
    }

    fn test_state() -> AppState {
        let store: Arc<dyn prowhey_store::KvStreamStore> = Arc::new(InMemoryStore::new());
        let cache = Arc::new(TransformedCache::new(store.clone()));
        let journal = Arc::new(ChangeJournal::new(store.clone()));
        AppState {
            detector: Arc::new(prowhey_store::ChangeDetector::new(store.clone())),
            indexes: Arc::new(prowhey_store::SecondaryIndexes::new(store.clone())),
            audience_filter: Arc::new(AudienceFilter),
            sync_processor: Arc::new(prowhey_ingest::SyncProcessor::new(
                Arc::new(NullErpClient),
                Arc::new(prowhey_ingest::JsonTransformer),
                store.clone(),
            )),
            erp: Arc::new(NullErpClient),
            cache,
            journal,
            store,
            config: Arc::new(crate::config::ApiConfig::default()),
            start_time: std::time::Instant::now(),
        }
    }

    #[tokio::test]
    async fn empty_cursor_set_is_in_sync() {
        let state = test_state();
        let body = SyncRequest {
            last_sync: Cursor::new(),
            entity_types: None,
            limit: None,
            user_id: None,
            user_groups: vec![],
            user_region: None,
            user_province: None,
            user_city: None,
            user_device_id: None,
            is_registered: false,
        };
        let Json(resp) = run_sync(&state, &body, None).await.unwrap();
        assert!(resp.in_sync);
    }

    #[tokio::test]
    async fn unscoped_type_returns_every_update() {
        let state = test_state();
        state
            .cache
            .set(
                EntityType::Stock,
                EntityId::new("sku-1"),
                EntityPayload::Stock(StockPayload { quantity: 5, warehouse: "RUH".into(), in_stock: true }),
                "h1".into(),
            )
            .await
            .unwrap();
        state
            .journal
            .append(
                EntityType::Stock,
                &JournalEntry {
                    id: JournalId::ZERO,
                    entity_id: "sku-1".into(),
                    data_hash: "h1".into(),
                    version: 1,
                    idempotency_key: None,
                    prev_hash: None,
                    target: None,
                },
            )
            .await
            .unwrap();

        let mut last_sync = Cursor::new();
        last_sync.insert(EntityType::Stock, JournalId::ZERO);
        let body = SyncRequest {
            last_sync,
            entity_types: None,
            limit: None,
            user_id: None,
            user_groups: vec![],
            user_region: None,
            user_province: None,
            user_city: None,
            user_device_id: None,
            is_registered: false,
        };
        let Json(resp) = run_sync(&state, &body, None).await.unwrap();
        assert!(!resp.in_sync);
        assert_eq!(resp.updates.len(), 1);
    }

    #[tokio::test]
    async fn notification_outside_audience_is_filtered_but_cursor_advances() {
        let state = test_state();
        let appended_id = state
            .journal
            .append(
                EntityType::Notification,
                &JournalEntry {
                    id: JournalId::ZERO,
                    entity_id: "notif-1".into(),
                    data_hash: "h1".into(),
                    version: 1,
                    idempotency_key: None,
                    prev_hash: None,
                    target: Some(TargetSet { provinces: vec!["Jeddah".into()], ..Default::default() }),
                },
            )
            .await
            .unwrap();

        let mut last_sync = Cursor::new();
        last_sync.insert(EntityType::Notification, JournalId::ZERO);
        let body = SyncRequest {
            last_sync,
            entity_types: None,
            limit: None,
            user_id: None,
            user_groups: vec![],
            user_region: None,
            user_province: Some("Riyadh".into()),
            user_city: None,
            user_device_id: None,
            is_registered: true,
        };
        let Json(resp) = run_sync(&state, &body, None).await.unwrap();
        assert!(resp.in_sync);
        assert_eq!(resp.last_ids.get(&EntityType::Notification), Some(&appended_id));
    }
}
