//! Shared data types for the transformed-entity cache and sync protocol.
//!
//! Pure data structures and pure functions only — no store access, no HTTP,
//! no ERP client. Every other crate in the workspace depends on this one.

mod caller;
mod cached_entity;
mod entity;
mod error;
mod hash;
mod journal;
mod payload;

pub use caller::CallerContext;
pub use cached_entity::{CachedEntity, TOMBSTONE_HASH};
pub use entity::{EntityId, EntityType, UnknownEntityType};
pub use error::{CoreError, CoreResult};
pub use hash::content_hash;
pub use journal::{Cursor, InvalidJournalId, JournalEntry, JournalId};
pub use payload::{
    AnnouncementPayload, BundlePayload, CommentPayload, EntityPayload, HeroPayload, HomePayload,
    HomeSection, MessagePayload, NotificationPayload, PricePayload, ProductPayload,
    ProductVariant, StockPayload, TargetSet, UserPayload, ViewPayload, VIEW_QUANTUM,
};
