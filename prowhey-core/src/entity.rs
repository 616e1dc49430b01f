//! Entity identity and the closed set of entity types the cache understands.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity type discriminator for the transformed cache and change journals.
///
/// This is a closed set: every cached entity, every journal, and every
/// sync-tier wrapper is keyed by one of these variants. Adding a new type
/// means touching the cache, the journal naming (`<type>_changes`), the
/// payload union in [`crate::EntityPayload`], and the sync tier it belongs
/// to (see `prowhey-ingest`'s sync processor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Product,
    Price,
    Stock,
    Hero,
    Bundle,
    Home,
    View,
    Comment,
    User,
    Notification,
    Announcement,
    Message,
}

impl EntityType {
    /// All entity types, in a stable order. Used by the scheduler and the
    /// full-refresh reconciler to enumerate "everything".
    pub const ALL: [EntityType; 12] = [
        EntityType::Product,
        EntityType::Price,
        EntityType::Stock,
        EntityType::Hero,
        EntityType::Bundle,
        EntityType::Home,
        EntityType::View,
        EntityType::Comment,
        EntityType::User,
        EntityType::Notification,
        EntityType::Announcement,
        EntityType::Message,
    ];

    /// The predefined sync frequency tiers (spec.md §4.7).
    pub const FAST_TIER: [EntityType; 3] = [EntityType::View, EntityType::Comment, EntityType::User];
    pub const MEDIUM_TIER: [EntityType; 4] = [
        EntityType::Stock,
        EntityType::Notification,
        EntityType::Announcement,
        EntityType::Message,
    ];
    pub const SLOW_TIER: [EntityType; 5] = [
        EntityType::Product,
        EntityType::Price,
        EntityType::Hero,
        EntityType::Home,
        EntityType::Bundle,
    ];

    /// The wire name used as a path/body discriminator (`"product"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Product => "product",
            EntityType::Price => "price",
            EntityType::Stock => "stock",
            EntityType::Hero => "hero",
            EntityType::Bundle => "bundle",
            EntityType::Home => "home",
            EntityType::View => "view",
            EntityType::Comment => "comment",
            EntityType::User => "user",
            EntityType::Notification => "notification",
            EntityType::Announcement => "announcement",
            EntityType::Message => "message",
        }
    }

    /// The journal's store key, `<type>_changes`.
    pub fn journal_key(&self) -> String {
        format!("{}_changes", self.as_str())
    }

    /// The cache entry's store key, `hash:<type>:<id>`.
    pub fn cache_key(&self, entity_id: &EntityId) -> String {
        format!("hash:{}:{}", self.as_str(), entity_id)
    }

    /// True for types whose journal entries carry audience targeting fields.
    pub fn is_audience_scoped(&self) -> bool {
        matches!(self, EntityType::Notification | EntityType::Message)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse error for [`EntityType::from_str`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown entity type: {0}")]
pub struct UnknownEntityType(pub String);

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(EntityType::Product),
            "price" => Ok(EntityType::Price),
            "stock" => Ok(EntityType::Stock),
            "hero" => Ok(EntityType::Hero),
            "bundle" => Ok(EntityType::Bundle),
            "home" => Ok(EntityType::Home),
            "view" => Ok(EntityType::View),
            "comment" => Ok(EntityType::Comment),
            "user" => Ok(EntityType::User),
            "notification" => Ok(EntityType::Notification),
            "announcement" => Ok(EntityType::Announcement),
            "message" => Ok(EntityType::Message),
            other => Err(UnknownEntityType(other.to_string())),
        }
    }
}

/// Opaque ERP-assigned entity identifier.
///
/// The ERP's ids are not UUIDs (SKUs, user codes, slugs), so unlike the
/// UUID-keyed identity system this workspace's template uses, this is a
/// thin newtype over `String`. Its purpose is the same: callers cannot
/// accidentally pass a raw string meant for one entity type as the id of
/// another, because every API that takes an id also takes the
/// [`EntityType`] it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_round_trips_through_str() {
        for ty in EntityType::ALL {
            let parsed: EntityType = ty.as_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }

    #[test]
    fn unknown_entity_type_is_rejected() {
        assert!("widget".parse::<EntityType>().is_err());
    }

    #[test]
    fn cache_key_and_journal_key_format() {
        let id = EntityId::new("WEB-ITM-0002");
        assert_eq!(EntityType::Product.cache_key(&id), "hash:product:WEB-ITM-0002");
        assert_eq!(EntityType::Product.journal_key(), "product_changes");
    }

    #[test]
    fn tiers_partition_all_types() {
        let mut seen: Vec<EntityType> = EntityType::FAST_TIER
            .into_iter()
            .chain(EntityType::MEDIUM_TIER)
            .chain(EntityType::SLOW_TIER)
            .collect();
        seen.sort_by_key(|t| t.as_str());
        let mut all: Vec<EntityType> = EntityType::ALL.to_vec();
        all.sort_by_key(|t| t.as_str());
        assert_eq!(seen, all);
    }
}
