//! The transformed cache's record shape (spec.md §3, `CachedEntity`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityType};
use crate::payload::EntityPayload;

/// Sentinel `data_hash` value written for a deleted entity.
pub const TOMBSTONE_HASH: &str = "__deleted__";

/// A single entry in the transformed cache, `hash:<entityType>:<entityId>`.
///
/// Invariants (enforced by [`crate::hash::content_hash`] and by the single
/// write routine in `prowhey-ingest`, never by this type alone):
/// - a write that does not change `data_hash` must not change `version`.
/// - `version` strictly increases, by exactly one per actual write.
/// - `data_hash` is a pure function of `payload`.
/// - deletion sets `data_hash` to [`TOMBSTONE_HASH`], clears `payload`, and
///   still bumps `version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CachedEntity {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    /// `None` iff `data_hash == TOMBSTONE_HASH`.
    pub payload: Option<EntityPayload>,
    pub data_hash: String,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl CachedEntity {
    pub fn new(
        entity_type: EntityType,
        entity_id: EntityId,
        payload: EntityPayload,
        data_hash: String,
        version: i64,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            payload: Some(payload),
            data_hash,
            version,
            updated_at,
        }
    }

    pub fn tombstone(
        entity_type: EntityType,
        entity_id: EntityId,
        version: i64,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            payload: None,
            data_hash: TOMBSTONE_HASH.to_string(),
            version,
            updated_at,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.data_hash == TOMBSTONE_HASH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{EntityPayload, StockPayload};

    #[test]
    fn tombstone_has_no_payload() {
        let t = CachedEntity::tombstone(EntityType::Stock, EntityId::new("sku-1"), 3, Utc::now());
        assert!(t.is_tombstone());
        assert!(t.payload.is_none());
    }

    #[test]
    fn live_entry_is_not_tombstone() {
        let e = CachedEntity::new(
            EntityType::Stock,
            EntityId::new("sku-1"),
            EntityPayload::Stock(StockPayload {
                quantity: 1,
                warehouse: "X".into(),
                in_stock: true,
            }),
            "abc".into(),
            1,
            Utc::now(),
        );
        assert!(!e.is_tombstone());
    }
}
