//! App-ready payload shapes produced by the Transformer and stored verbatim
//! by the transformed cache.
//!
//! Design note (spec.md §9, "Dynamic payload unions"): the reference system
//! flows every entity type through the same untyped JSON blob. Here the
//! payload is a tagged `enum` over [`EntityType`] so the Transformer and the
//! HTTP surface get compile-time exhaustiveness instead of stringly-typed
//! dispatch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityType;

/// App-ready payload for a `product` entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProductPayload {
    pub name: String,
    pub description: Option<String>,
    pub image_base64: Option<String>,
    pub categories: Vec<String>,
    pub variants: Vec<ProductVariant>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProductVariant {
    pub sku: String,
    pub attributes: HashMap<String, String>,
}

/// App-ready payload for a `price` entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PricePayload {
    pub amount: f64,
    pub currency: String,
    pub discounted_amount: Option<f64>,
}

/// App-ready payload for a `stock` entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StockPayload {
    pub quantity: i64,
    pub warehouse: String,
    pub in_stock: bool,
}

/// App-ready payload for a `hero` banner entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HeroPayload {
    pub title: String,
    pub image_base64: Option<String>,
    pub link: Option<String>,
    pub order: i32,
}

/// App-ready payload for a `bundle` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BundlePayload {
    pub title: String,
    pub product_ids: Vec<String>,
    pub discount_percent: Option<f64>,
}

/// App-ready payload for the `home` singleton collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HomePayload {
    pub sections: Vec<HomeSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HomeSection {
    pub key: String,
    pub title: String,
    pub entity_ids: Vec<String>,
}

/// App-ready payload for a `view` counter.
///
/// View journal entries are only appended every `VIEW_QUANTUM`-th
/// increment (spec.md §9 open question, resolved in DESIGN.md): clients
/// observe views in quantized jumps, not every single increment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ViewPayload {
    pub count: i64,
}

/// The quantum at which view-count changes are journaled.
pub const VIEW_QUANTUM: i64 = 10;

/// App-ready payload for a `comment` entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommentPayload {
    pub author_user_id: String,
    pub body: String,
    pub rating: Option<u8>,
    pub deleted: bool,
}

/// App-ready payload for a `user` profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserPayload {
    pub display_name: String,
    pub groups: Vec<String>,
    pub region: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub is_registered: bool,
}

/// App-ready payload for a `notification` entry, carrying its audience
/// target set (spec.md §4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub target: TargetSet,
}

/// The disjunctive target-set evaluated by the Audience Filter.
///
/// Stored in journal entries as JSON-encoded list fields (spec.md §9): the
/// store's stream primitive only holds flat string fields, so the ingest
/// path encodes this struct and the filter decodes it. Treated as a
/// serialization boundary here, not baked into the stream layer's type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TargetSet {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub provinces: Vec<String>,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub non_registered: bool,
}

impl TargetSet {
    /// True when every list is empty and `non_registered` is false — the
    /// "broadcast to everyone" case (spec.md §4.5 rule 8).
    pub fn is_broadcast(&self) -> bool {
        self.users.is_empty()
            && self.groups.is_empty()
            && self.regions.is_empty()
            && self.provinces.is_empty()
            && self.cities.is_empty()
            && self.devices.is_empty()
            && !self.non_registered
    }
}

/// App-ready payload for an `announcement`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnnouncementPayload {
    pub title: String,
    pub body: String,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// App-ready payload for a `message` log entry (user-scoped, not
/// target-set scoped — spec.md §4.5's simpler rule).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessagePayload {
    pub user_id: String,
    pub channel: String,
    pub body: String,
    pub deleted: bool,
}

/// Tagged union of every app-ready payload shape, keyed by [`EntityType`].
///
/// The cache stores the variant matching its key's entity type; the
/// Transformer is the only place that constructs one of these from raw ERP
/// data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity_type", rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityPayload {
    Product(ProductPayload),
    Price(PricePayload),
    Stock(StockPayload),
    Hero(HeroPayload),
    Bundle(BundlePayload),
    Home(HomePayload),
    View(ViewPayload),
    Comment(CommentPayload),
    User(UserPayload),
    Notification(NotificationPayload),
    Announcement(AnnouncementPayload),
    Message(MessagePayload),
}

impl EntityPayload {
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityPayload::Product(_) => EntityType::Product,
            EntityPayload::Price(_) => EntityType::Price,
            EntityPayload::Stock(_) => EntityType::Stock,
            EntityPayload::Hero(_) => EntityType::Hero,
            EntityPayload::Bundle(_) => EntityType::Bundle,
            EntityPayload::Home(_) => EntityType::Home,
            EntityPayload::View(_) => EntityType::View,
            EntityPayload::Comment(_) => EntityType::Comment,
            EntityPayload::User(_) => EntityType::User,
            EntityPayload::Notification(_) => EntityType::Notification,
            EntityPayload::Announcement(_) => EntityType::Announcement,
            EntityPayload::Message(_) => EntityType::Message,
        }
    }

    /// The notification's target set, if this payload carries one.
    pub fn target_set(&self) -> Option<&TargetSet> {
        match self {
            EntityPayload::Notification(n) => Some(&n.target),
            _ => None,
        }
    }

    /// The message's owning user id, if this payload is a message.
    pub fn message_user_id(&self) -> Option<&str> {
        match self {
            EntityPayload::Message(m) => Some(&m.user_id),
            _ => None,
        }
    }

    /// The audience-filter key to journal alongside this payload (spec.md
    /// §4.5, §9): a notification's target set verbatim, or a message
    /// recast as a single-user target set so the journal's audience field
    /// is uniform across both scoped types. `None` for a soft-deleted
    /// message (it is never delivered to anyone) or an unscoped type.
    pub fn audience_key(&self) -> Option<TargetSet> {
        match self {
            EntityPayload::Notification(n) => Some(n.target.clone()),
            EntityPayload::Message(m) if !m.deleted => Some(TargetSet {
                users: vec![m.user_id.clone()],
                ..Default::default()
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_matches_payload_variant() {
        let payload = EntityPayload::Stock(StockPayload {
            quantity: 5,
            warehouse: "RUH-01".into(),
            in_stock: true,
        });
        assert_eq!(payload.entity_type(), EntityType::Stock);
    }

    #[test]
    fn target_set_broadcast_detection() {
        assert!(TargetSet::default().is_broadcast());
        let scoped = TargetSet {
            provinces: vec!["Riyadh".into()],
            ..Default::default()
        };
        assert!(!scoped.is_broadcast());
    }
}
