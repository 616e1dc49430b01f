//! The per-entity-type change journal (spec.md §4.3).
//!
//! Backed by the store's stream primitive (`XADD`/`XRANGE`/`XLEN`/`XTRIM`),
//! at key `<entityType>_changes`. Entries are read back oldest-first and
//! their id doubles as the client's sync cursor.

use std::sync::Arc;

use prowhey_core::{EntityType, JournalEntry, JournalId, TargetSet};

use crate::error::StoreResult;
use crate::kv::KvStreamStore;

pub struct ChangeJournal {
    store: Arc<dyn KvStreamStore>,
}

impl ChangeJournal {
    pub fn new(store: Arc<dyn KvStreamStore>) -> Self {
        Self { store }
    }

    /// Append an entry and return the id the store assigned it.
    pub async fn append(&self, entity_type: EntityType, entry: &JournalEntry) -> StoreResult<JournalId> {
        let mut fields = vec![
            ("entity_id".to_string(), entry.entity_id.clone()),
            ("data_hash".to_string(), entry.data_hash.clone()),
            ("version".to_string(), entry.version.to_string()),
        ];
        if let Some(key) = &entry.idempotency_key {
            fields.push(("idempotency_key".to_string(), key.clone()));
        }
        if let Some(prev) = &entry.prev_hash {
            fields.push(("prev_hash".to_string(), prev.clone()));
        }
        if let Some(target) = &entry.target {
            fields.push(("target".to_string(), serde_json::to_string(target)?));
        }
        let id = self.store.xadd(&entity_type.journal_key(), &fields).await?;
        Ok(id.parse()?)
    }

    /// Read every entry strictly after `cursor` (exclusive), oldest first.
    pub async fn read_since(
        &self,
        entity_type: EntityType,
        cursor: JournalId,
    ) -> StoreResult<Vec<(JournalId, JournalEntry)>> {
        let records = self
            .store
            .xrange(&entity_type.journal_key(), "-", "+")
            .await?;
        let mut out = Vec::new();
        for record in records {
            let id: JournalId = record.id.parse()?;
            if id <= cursor {
                continue;
            }
            out.push((id, decode_entry(id, &record.fields)?));
        }
        Ok(out)
    }

    pub async fn length(&self, entity_type: EntityType) -> StoreResult<u64> {
        Ok(self.store.xlen(&entity_type.journal_key()).await?)
    }

    pub async fn trim(&self, entity_type: EntityType, max_len: u64) -> StoreResult<u64> {
        Ok(self.store.xtrim(&entity_type.journal_key(), max_len).await?)
    }

    /// Evict every entry older than `cutoff_ms` (epoch milliseconds), the
    /// age axis of spec.md §3's "7 days or 10k entries, whichever is
    /// tighter" retention rule — [`Self::trim`] covers the count axis.
    pub async fn trim_older_than(&self, entity_type: EntityType, cutoff_ms: u64) -> StoreResult<u64> {
        let min_id = format!("{cutoff_ms}-0");
        Ok(self.store.xtrim_before(&entity_type.journal_key(), &min_id).await?)
    }
}

fn decode_entry(id: JournalId, fields: &[(String, String)]) -> StoreResult<JournalEntry> {
    let find = |name: &str| fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());
    let entity_id = find("entity_id").ok_or_else(|| crate::error::StoreError::Command(
        format!("journal entry {id} missing entity_id"),
    ))?;
    let data_hash = find("data_hash").ok_or_else(|| crate::error::StoreError::Command(
        format!("journal entry {id} missing data_hash"),
    ))?;
    let version = find("version")
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| crate::error::StoreError::Command(format!("journal entry {id} missing version")))?;
    let target: Option<TargetSet> = find("target")
        .map(|raw| serde_json::from_str(&raw))
        .transpose()?;
    Ok(JournalEntry {
        id,
        entity_id,
        data_hash,
        version,
        idempotency_key: find("idempotency_key"),
        prev_hash: find("prev_hash"),
        target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryStore;

    fn journal() -> ChangeJournal {
        ChangeJournal::new(Arc::new(InMemoryStore::new()))
    }

    fn entry(entity_id: &str, version: i64) -> JournalEntry {
        JournalEntry {
            id: JournalId::ZERO,
            entity_id: entity_id.to_string(),
            data_hash: "abc".to_string(),
            version,
            idempotency_key: None,
            prev_hash: None,
            target: None,
        }
    }

    #[tokio::test]
    async fn append_then_read_since_zero_returns_everything() {
        let j = journal();
        j.append(EntityType::Stock, &entry("sku-1", 1)).await.unwrap();
        j.append(EntityType::Stock, &entry("sku-2", 1)).await.unwrap();
        let all = j.read_since(EntityType::Stock, JournalId::ZERO).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn read_since_excludes_entries_at_or_before_cursor() {
        let j = journal();
        let id1 = j.append(EntityType::Stock, &entry("sku-1", 1)).await.unwrap();
        j.append(EntityType::Stock, &entry("sku-2", 1)).await.unwrap();
        let after = j.read_since(EntityType::Stock, id1).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].1.entity_id, "sku-2");
    }

    #[tokio::test]
    async fn trim_older_than_evicts_only_entries_before_cutoff() {
        let j = journal();
        for i in 0..5 {
            j.append(EntityType::Stock, &entry(&format!("sku-{i}"), 1)).await.unwrap();
        }
        // Each append above lands on its own millisecond id (1-0 .. 5-0) in
        // the in-memory store; a cutoff of 3 should drop the first two.
        j.trim_older_than(EntityType::Stock, 3).await.unwrap();
        let remaining = j.read_since(EntityType::Stock, JournalId::ZERO).await.unwrap();
        assert_eq!(remaining.len(), 3);
    }

    #[tokio::test]
    async fn trim_respects_max_len() {
        let j = journal();
        for i in 0..5 {
            j.append(EntityType::Stock, &entry(&format!("sku-{i}"), 1)).await.unwrap();
        }
        assert_eq!(j.length(EntityType::Stock).await.unwrap(), 5);
        j.trim(EntityType::Stock, 2).await.unwrap();
        assert_eq!(j.length(EntityType::Stock).await.unwrap(), 2);
    }
}
