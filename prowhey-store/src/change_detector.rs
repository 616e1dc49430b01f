//! The change detector (spec.md §4.4): the only place that decides whether
//! an incoming payload is genuinely new, a genuine update, a no-op repeat,
//! or a deletion — and the only place that appends to the journal.
//!
//! Every ingest path (webhook, read-through, full refresh) must route
//! through here so that identical payloads always produce identical
//! `data_hash`es and therefore identical no-op behavior regardless of
//! which path observed them.

use std::sync::Arc;

use prowhey_core::{
    content_hash, CachedEntity, EntityId, EntityPayload, EntityType, JournalEntry, JournalId,
    TOMBSTONE_HASH, VIEW_QUANTUM,
};

use crate::change_journal::ChangeJournal;
use crate::error::StoreResult;
use crate::kv::KvStreamStore;
use crate::transformed_cache::TransformedCache;

#[derive(Debug, Clone, PartialEq)]
pub enum DetectedChange {
    Created(CachedEntity),
    Updated(CachedEntity),
    Deleted(CachedEntity),
    Unchanged,
}

pub struct ChangeDetector {
    cache: TransformedCache,
    journal: ChangeJournal,
}

impl ChangeDetector {
    pub fn new(store: Arc<dyn KvStreamStore>) -> Self {
        Self {
            cache: TransformedCache::new(store.clone()),
            journal: ChangeJournal::new(store),
        }
    }

    /// Apply an observed payload for `entity_id`. Returns `Unchanged` and
    /// appends nothing to the journal when the content hash matches what's
    /// already cached (spec.md §4.4's core invariant: a write that doesn't
    /// change `data_hash` must not bump `version` or journal an entry).
    pub async fn apply(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        payload: EntityPayload,
        idempotency_key: Option<String>,
    ) -> StoreResult<DetectedChange> {
        let hash = content_hash(&payload)?;
        let existing = self.cache.get(entity_type, &entity_id).await?;
        let is_create = existing.as_ref().map(|e| e.is_tombstone()).unwrap_or(true);
        if let Some(existing) = &existing {
            if !existing.is_tombstone() && existing.data_hash == hash {
                return Ok(DetectedChange::Unchanged);
            }
        }
        let prev_hash = existing.map(|e| e.data_hash);
        let target = payload.audience_key();
        // View counters journal only every VIEW_QUANTUM-th increment (spec.md
        // §9 open question): the cache always holds the live count, but the
        // change feed only notes it at the quantum boundary, so clients
        // observe views in quantised jumps rather than on every single view.
        let view_count = match &payload {
            EntityPayload::View(v) => Some(v.count),
            _ => None,
        };
        let written = self
            .cache
            .set(entity_type, entity_id.clone(), payload, hash.clone())
            .await?;
        let should_journal = match view_count {
            Some(count) => count % VIEW_QUANTUM == 0,
            None => true,
        };
        if should_journal {
            self.journal
                .append(
                    entity_type,
                    &JournalEntry {
                        id: JournalId::ZERO,
                        entity_id: entity_id.as_str().to_string(),
                        data_hash: hash,
                        version: written.version,
                        idempotency_key,
                        prev_hash,
                        target,
                    },
                )
                .await?;
        }
        Ok(if is_create {
            DetectedChange::Created(written)
        } else {
            DetectedChange::Updated(written)
        })
    }

    /// Mark `entity_id` deleted. A no-op (no journal entry, `Ok(None)`) if
    /// it was already a tombstone or never existed.
    pub async fn delete(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        idempotency_key: Option<String>,
    ) -> StoreResult<Option<DetectedChange>> {
        let existing = self.cache.get(entity_type, &entity_id).await?;
        if existing.as_ref().map(|e| e.is_tombstone()).unwrap_or(true) {
            return Ok(None);
        }
        let prev_hash = existing.as_ref().map(|e| e.data_hash.clone());
        // Carry the prior audience key forward so a scoped type's deletion
        // still reaches the right client (the cache tombstone itself clears
        // the payload, which would otherwise lose this information).
        let target = existing
            .as_ref()
            .and_then(|e| e.payload.as_ref())
            .and_then(|p| p.audience_key());
        let tombstoned = self.cache.tombstone(entity_type, entity_id.clone()).await?;
        self.journal
            .append(
                entity_type,
                &JournalEntry {
                    id: JournalId::ZERO,
                    entity_id: entity_id.as_str().to_string(),
                    data_hash: TOMBSTONE_HASH.to_string(),
                    version: tombstoned.version,
                    idempotency_key,
                    prev_hash,
                    target,
                },
            )
            .await?;
        Ok(Some(DetectedChange::Deleted(tombstoned)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryStore;
    use prowhey_core::{StockPayload, ViewPayload};

    fn detector() -> ChangeDetector {
        ChangeDetector::new(Arc::new(InMemoryStore::new()))
    }

    fn stock(quantity: i64) -> EntityPayload {
        EntityPayload::Stock(StockPayload {
            quantity,
            warehouse: "RUH".into(),
            in_stock: quantity > 0,
        })
    }

    #[tokio::test]
    async fn first_observation_is_a_creation() {
        let d = detector();
        let id = EntityId::new("sku-1");
        let change = d.apply(EntityType::Stock, id, stock(5), None).await.unwrap();
        assert!(matches!(change, DetectedChange::Created(_)));
    }

    #[tokio::test]
    async fn repeated_identical_payload_is_unchanged_and_does_not_journal() {
        let d = detector();
        let id = EntityId::new("sku-1");
        d.apply(EntityType::Stock, id.clone(), stock(5), None).await.unwrap();
        let second = d.apply(EntityType::Stock, id, stock(5), None).await.unwrap();
        assert_eq!(second, DetectedChange::Unchanged);
    }

    #[tokio::test]
    async fn changed_payload_is_an_update() {
        let d = detector();
        let id = EntityId::new("sku-1");
        d.apply(EntityType::Stock, id.clone(), stock(5), None).await.unwrap();
        let second = d.apply(EntityType::Stock, id, stock(6), None).await.unwrap();
        assert!(matches!(second, DetectedChange::Updated(_)));
    }

    #[tokio::test]
    async fn delete_of_unknown_entity_is_a_no_op() {
        let d = detector();
        let id = EntityId::new("sku-never-seen");
        let result = d.delete(EntityType::Stock, id, None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_then_recreate_is_a_creation_again() {
        let d = detector();
        let id = EntityId::new("sku-1");
        d.apply(EntityType::Stock, id.clone(), stock(5), None).await.unwrap();
        d.delete(EntityType::Stock, id.clone(), None).await.unwrap();
        let recreated = d.apply(EntityType::Stock, id, stock(5), None).await.unwrap();
        assert!(matches!(recreated, DetectedChange::Created(_)));
    }

    fn view(count: i64) -> EntityPayload {
        EntityPayload::View(ViewPayload { count })
    }

    #[tokio::test]
    async fn view_increments_below_quantum_are_not_journaled() {
        let d = detector();
        let id = EntityId::new("product-1");
        for count in 1..10 {
            d.apply(EntityType::View, id.clone(), view(count), None).await.unwrap();
        }
        let entries = d.journal.read_since(EntityType::View, JournalId::ZERO).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn view_increment_at_quantum_boundary_is_journaled() {
        let d = detector();
        let id = EntityId::new("product-1");
        for count in 1..=10 {
            d.apply(EntityType::View, id.clone(), view(count), None).await.unwrap();
        }
        let entries = d.journal.read_since(EntityType::View, JournalId::ZERO).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1.data_hash, content_hash(&view(10)).unwrap());
    }

    #[tokio::test]
    async fn view_cache_reflects_live_count_even_when_not_journaled() {
        let d = detector();
        let id = EntityId::new("product-1");
        for count in 1..=5 {
            d.apply(EntityType::View, id.clone(), view(count), None).await.unwrap();
        }
        let cached = d.cache.get(EntityType::View, &id).await.unwrap().unwrap();
        assert_eq!(cached.payload, Some(view(5)));
    }
}
