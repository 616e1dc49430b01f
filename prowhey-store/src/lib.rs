//! Store-backed building blocks sitting directly on the KV/stream primitive:
//! the transformed cache, the change journal, the change detector that
//! bridges them, the audience filter, and the secondary user indexes.

mod audience_filter;
mod change_detector;
mod change_journal;
mod error;
mod indexes;
mod kv;
mod memory_store;
mod redis_store;
mod transformed_cache;

pub use audience_filter::AudienceFilter;
pub use change_detector::{ChangeDetector, DetectedChange};
pub use change_journal::ChangeJournal;
pub use error::{StoreError, StoreResult};
pub use indexes::SecondaryIndexes;
pub use kv::{KvStreamStore, StreamRecord};
pub use memory_store::InMemoryStore;
pub use redis_store::RedisStore;
pub use transformed_cache::TransformedCache;
