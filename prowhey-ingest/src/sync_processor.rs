//! The sync processor (spec.md §4.7): fetches, transforms, and detects
//! changes for a set of entity types, then tombstones anything the ERP no
//! longer reports. Shared by the webhook path (single entity), the
//! scheduled tier sweeps, and the weekly full refresh — all three just
//! call [`SyncProcessor::sync_entity_type`] with different scopes.

use std::sync::Arc;

use prowhey_core::{EntityId, EntityType};
use prowhey_store::{ChangeDetector, DetectedChange, KvStreamStore};

use crate::erp_client::ErpClient;
use crate::error::IngestResult;
use crate::transformer::Transformer;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
}

impl SyncSummary {
    fn record(&mut self, change: &DetectedChange) {
        match change {
            DetectedChange::Created(_) => self.created += 1,
            DetectedChange::Updated(_) => self.updated += 1,
            DetectedChange::Unchanged => self.unchanged += 1,
            DetectedChange::Deleted(_) => self.deleted += 1,
        }
    }

    fn merge(&mut self, other: SyncSummary) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.deleted += other.deleted;
    }
}

pub struct SyncProcessor {
    erp: Arc<dyn ErpClient>,
    transformer: Arc<dyn Transformer>,
    detector: ChangeDetector,
    store: Arc<dyn KvStreamStore>,
}

impl SyncProcessor {
    pub fn new(erp: Arc<dyn ErpClient>, transformer: Arc<dyn Transformer>, store: Arc<dyn KvStreamStore>) -> Self {
        Self {
            erp,
            transformer,
            detector: ChangeDetector::new(store.clone()),
            store,
        }
    }

    /// Sync a single entity type against the ERP's current full listing:
    /// fetch, transform and detect each record, then tombstone any
    /// previously-cached entity the ERP no longer reports.
    pub async fn sync_entity_type(&self, entity_type: EntityType) -> IngestResult<SyncSummary> {
        let mut summary = SyncSummary::default();
        let records = self.erp.fetch_all(entity_type).await?;
        let mut seen = std::collections::HashSet::new();

        for record in &records {
            seen.insert(record.entity_id.clone());
            let payload = self.transformer.transform(entity_type, record)?;
            let change = self
                .detector
                .apply(entity_type, EntityId::new(record.entity_id.clone()), payload, None)
                .await?;
            summary.record(&change);
        }

        let prefix = format!("hash:{}:", entity_type.as_str());
        let existing_keys = self.store.scan_keys(&format!("{prefix}*")).await?;
        for key in existing_keys {
            let Some(id) = key.strip_prefix(&prefix) else { continue };
            if seen.contains(id) {
                continue;
            }
            if let Some(change) = self
                .detector
                .delete(entity_type, EntityId::new(id.to_string()), None)
                .await?
            {
                summary.record(&change);
            }
        }

        Ok(summary)
    }

    /// Sync one entity by id, for the webhook and read-through paths —
    /// never tombstones siblings, since the ERP wasn't asked about them.
    /// `idempotency_key` is threaded onto the resulting journal entry, if
    /// one is appended (spec.md §4.6).
    pub async fn sync_one(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        idempotency_key: Option<String>,
    ) -> IngestResult<Option<SyncSummary>> {
        let Some(record) = self.erp.fetch_one(entity_type, entity_id).await? else {
            let mut summary = SyncSummary::default();
            if let Some(change) = self
                .detector
                .delete(entity_type, EntityId::new(entity_id.to_string()), idempotency_key)
                .await?
            {
                summary.record(&change);
                return Ok(Some(summary));
            }
            return Ok(None);
        };
        let payload = self.transformer.transform(entity_type, &record)?;
        let change = self
            .detector
            .apply(entity_type, EntityId::new(entity_id.to_string()), payload, idempotency_key)
            .await?;
        let mut summary = SyncSummary::default();
        summary.record(&change);
        Ok(Some(summary))
    }

    async fn sync_tier(&self, tier: &[EntityType]) -> IngestResult<SyncSummary> {
        let mut total = SyncSummary::default();
        for entity_type in tier {
            total.merge(self.sync_entity_type(*entity_type).await?);
        }
        Ok(total)
    }

    pub async fn process_fast_sync(&self) -> IngestResult<SyncSummary> {
        self.sync_tier(&EntityType::FAST_TIER).await
    }

    pub async fn process_medium_sync(&self) -> IngestResult<SyncSummary> {
        self.sync_tier(&EntityType::MEDIUM_TIER).await
    }

    pub async fn process_slow_sync(&self) -> IngestResult<SyncSummary> {
        self.sync_tier(&EntityType::SLOW_TIER).await
    }

    /// The weekly full refresh: every entity type, in tier order.
    pub async fn process_full_refresh(&self) -> IngestResult<SyncSummary> {
        let mut total = SyncSummary::default();
        for entity_type in EntityType::ALL {
            total.merge(self.sync_entity_type(entity_type).await?);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erp_client::mock::MockErpClient;
    use crate::transformer::JsonTransformer;
    use prowhey_store::InMemoryStore;
    use serde_json::json;

    fn processor() -> (Arc<MockErpClient>, SyncProcessor) {
        let erp = Arc::new(MockErpClient::new());
        let store: Arc<dyn KvStreamStore> = Arc::new(InMemoryStore::new());
        let processor = SyncProcessor::new(erp.clone(), Arc::new(JsonTransformer), store);
        (erp, processor)
    }

    #[tokio::test]
    async fn first_sync_creates_every_record() {
        let (erp, processor) = processor();
        erp.put(EntityType::Stock, "sku-1", json!({"quantity": 5, "warehouse": "RUH", "in_stock": true}));
        erp.put(EntityType::Stock, "sku-2", json!({"quantity": 0, "warehouse": "JED", "in_stock": false}));

        let summary = processor.sync_entity_type(EntityType::Stock).await.unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.deleted, 0);
    }

    #[tokio::test]
    async fn second_sync_with_no_changes_reports_unchanged() {
        let (erp, processor) = processor();
        erp.put(EntityType::Stock, "sku-1", json!({"quantity": 5, "warehouse": "RUH", "in_stock": true}));
        processor.sync_entity_type(EntityType::Stock).await.unwrap();

        let summary = processor.sync_entity_type(EntityType::Stock).await.unwrap();
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.created, 0);
    }

    #[tokio::test]
    async fn entity_removed_from_erp_is_tombstoned_on_next_sync() {
        let (erp, processor) = processor();
        erp.put(EntityType::Stock, "sku-1", json!({"quantity": 5, "warehouse": "RUH", "in_stock": true}));
        processor.sync_entity_type(EntityType::Stock).await.unwrap();

        erp.remove(EntityType::Stock, "sku-1");
        let summary = processor.sync_entity_type(EntityType::Stock).await.unwrap();
        assert_eq!(summary.deleted, 1);
    }

    #[tokio::test]
    async fn sync_one_handles_single_entity_without_touching_siblings() {
        let (erp, processor) = processor();
        erp.put(EntityType::Stock, "sku-1", json!({"quantity": 5, "warehouse": "RUH", "in_stock": true}));
        erp.put(EntityType::Stock, "sku-2", json!({"quantity": 1, "warehouse": "RUH", "in_stock": true}));
        processor.sync_entity_type(EntityType::Stock).await.unwrap();

        erp.put(EntityType::Stock, "sku-1", json!({"quantity": 99, "warehouse": "RUH", "in_stock": true}));
        let summary = processor.sync_one(EntityType::Stock, "sku-1", None).await.unwrap().unwrap();
        assert_eq!(summary.updated, 1);
    }
}
