//! Store-backed rate limiting (spec.md §5, §6, §9 open question 1).
//!
//! Backed by the same KV store as everything else, at
//! `ratelimit:<deviceId>:<endpoint>` (INCR + EXPIRE-on-first-hit). If the
//! store is unreachable the check fails open — the request is allowed,
//! per spec.md §5's "rate-limit checks fail-open" graceful-degradation
//! policy — rather than turning a store outage into a full outage.

use axum::{extract::Request, extract::State, middleware::Next, response::Response};

use crate::error::ApiError;
use crate::middleware::request_context::DeviceId;
use crate::state::AppState;

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.rate_limit_enabled {
        return Ok(next.run(request).await);
    }

    let device_id = request
        .extensions()
        .get::<DeviceId>()
        .map(|d| d.0.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let endpoint = request.uri().path().to_string();
    let key = format!("ratelimit:{device_id}:{endpoint}");

    match check_and_increment(&state, &key).await {
        Ok(true) => Ok(next.run(request).await),
        Ok(false) => Err(ApiError::rate_limited(format!(
            "rate limit exceeded for {endpoint}"
        ))),
        Err(e) => {
            tracing::warn!(error = %e, %key, "rate limit check failed, failing open");
            Ok(next.run(request).await)
        }
    }
}

async fn check_and_increment(state: &AppState, key: &str) -> prowhey_store::StoreResult<bool> {
    let hits = state.store.incr(key).await?;
    if hits == 1 {
        state
            .store
            .expire(key, state.config.rate_limit_window.as_secs())
            .await?;
    }
    Ok(hits <= state.config.rate_limit_per_device_per_minute as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prowhey_core::EntityType;
    use prowhey_ingest::{ErpClient, IngestResult, JsonTransformer, RawRecord, SyncProcessor};
    use prowhey_store::InMemoryStore;
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

    fn state(limit: u32) -> AppState {
        let store: Arc<dyn prowhey_store::KvStreamStore> = Arc::new(InMemoryStore::new());
        let mut config = crate::config::ApiConfig::default();
        config.rate_limit_per_device_per_minute = limit;
        AppState {
            cache: Arc::new(prowhey_store::TransformedCache::new(store.clone())),
            journal: Arc::new(prowhey_store::ChangeJournal::new(store.clone())),
            detector: Arc::new(prowhey_store::ChangeDetector::new(store.clone())),
            indexes: Arc::new(prowhey_store::SecondaryIndexes::new(store.clone())),
            audience_filter: Arc::new(prowhey_store::AudienceFilter),
            sync_processor: Arc::new(SyncProcessor::new(
                Arc::new(NullErpClient),
                Arc::new(JsonTransformer),
                store.clone(),
            )),
            erp: Arc::new(NullErpClient),
            store,
            config: Arc::new(config),
            start_time: std::time::Instant::now(),
        }
    }

    #[tokio::test]
    async fn allows_requests_under_the_limit() {
        let state = state(2);
        assert!(check_and_increment(&state, "ratelimit:dev:/x").await.unwrap());
        assert!(check_and_increment(&state, "ratelimit:dev:/x").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_requests_over_the_limit() {
        let state = state(1);
        assert!(check_and_increment(&state, "ratelimit:dev:/x").await.unwrap());
        assert!(!check_and_increment(&state, "ratelimit:dev:/x").await.unwrap());
    }
}
