//! The transformed-entity cache (spec.md §4.2).
//!
//! Stores the app-ready [`CachedEntity`] at `hash:<entityType>:<entityId>`.
//! This is the only place that touches that key; the journal and the
//! detector call through it rather than the raw store.

use std::sync::Arc;

use chrono::Utc;
use prowhey_core::{CachedEntity, EntityId, EntityPayload, EntityType};

use crate::error::StoreResult;
use crate::kv::KvStreamStore;

pub struct TransformedCache {
    store: Arc<dyn KvStreamStore>,
}

impl TransformedCache {
    pub fn new(store: Arc<dyn KvStreamStore>) -> Self {
        Self { store }
    }

    pub async fn get(
        &self,
        entity_type: EntityType,
        entity_id: &EntityId,
    ) -> StoreResult<Option<CachedEntity>> {
        let key = entity_type.cache_key(entity_id);
        match self.store.get(&key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Write a new or updated live entry, bumping `version` from whatever
    /// was previously stored (0 if this is the first write).
    pub async fn set(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        payload: EntityPayload,
        data_hash: String,
    ) -> StoreResult<CachedEntity> {
        let previous_version = self
            .get(entity_type, &entity_id)
            .await?
            .map(|e| e.version)
            .unwrap_or(0);
        let entry = CachedEntity::new(
            entity_type,
            entity_id.clone(),
            payload,
            data_hash,
            previous_version + 1,
            Utc::now(),
        );
        let key = entity_type.cache_key(&entity_id);
        self.store.set(&key, &serde_json::to_string(&entry)?).await?;
        Ok(entry)
    }

    /// Replace the entry with a tombstone, bumping `version` (spec.md §4.2,
    /// §4.4 — deletion always bumps version even though there is no payload
    /// to hash).
    pub async fn tombstone(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
    ) -> StoreResult<CachedEntity> {
        let previous_version = self
            .get(entity_type, &entity_id)
            .await?
            .map(|e| e.version)
            .unwrap_or(0);
        let entry = CachedEntity::tombstone(entity_type, entity_id.clone(), previous_version + 1, Utc::now());
        let key = entity_type.cache_key(&entity_id);
        self.store.set(&key, &serde_json::to_string(&entry)?).await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryStore;
    use prowhey_core::StockPayload;

    fn cache() -> TransformedCache {
        TransformedCache::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = cache();
        let id = EntityId::new("sku-1");
        let payload = EntityPayload::Stock(StockPayload {
            quantity: 3,
            warehouse: "RUH".into(),
            in_stock: true,
        });
        let written = cache
            .set(EntityType::Stock, id.clone(), payload, "abc".into())
            .await
            .unwrap();
        assert_eq!(written.version, 1);

        let read = cache.get(EntityType::Stock, &id).await.unwrap().unwrap();
        assert_eq!(read.data_hash, "abc");
    }

    #[tokio::test]
    async fn version_increments_monotonically() {
        let cache = cache();
        let id = EntityId::new("sku-1");
        let payload = EntityPayload::Stock(StockPayload {
            quantity: 3,
            warehouse: "RUH".into(),
            in_stock: true,
        });
        cache.set(EntityType::Stock, id.clone(), payload.clone(), "a".into()).await.unwrap();
        let second = cache.set(EntityType::Stock, id.clone(), payload, "b".into()).await.unwrap();
        assert_eq!(second.version, 2);
    }

    #[tokio::test]
    async fn tombstone_bumps_version_and_clears_payload() {
        let cache = cache();
        let id = EntityId::new("sku-1");
        let payload = EntityPayload::Stock(StockPayload {
            quantity: 3,
            warehouse: "RUH".into(),
            in_stock: true,
        });
        cache.set(EntityType::Stock, id.clone(), payload, "a".into()).await.unwrap();
        let deleted = cache.tombstone(EntityType::Stock, id.clone()).await.unwrap();
        assert_eq!(deleted.version, 2);
        assert!(deleted.is_tombstone());
    }
}
