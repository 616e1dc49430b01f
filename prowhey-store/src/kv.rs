//! The store primitive every higher-level component (cache, journal, index,
//! rate limiter) is built from (spec.md §4.9/§6).
//!
//! Mirrors the Redis command surface the spec calls out directly
//! (GET/SET/INCR, HGETALL/HSET, SADD/SREM, XADD/XREAD/XRANGE/XLEN/XTRIM)
//! rather than inventing a higher-level abstraction over it, so the
//! production backend is a near 1:1 mapping and the in-memory backend used
//! in tests is easy to keep honest against it.

use async_trait::async_trait;

use crate::error::StoreResult;

/// One entry read back from a stream range (`XRANGE`/`XREAD`): an id plus
/// its flat field list, in the order the producer supplied them.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRecord {
    pub id: String,
    pub fields: Vec<(String, String)>,
}

#[async_trait]
pub trait KvStreamStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreResult<()>;
    async fn delete(&self, key: &str) -> StoreResult<()>;
    async fn incr(&self, key: &str) -> StoreResult<i64>;
    async fn expire(&self, key: &str, ttl_seconds: u64) -> StoreResult<()>;

    async fn hgetall(&self, key: &str) -> StoreResult<Vec<(String, String)>>;
    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;
    async fn hdel(&self, key: &str, field: &str) -> StoreResult<()>;

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()>;
    async fn srem(&self, key: &str, member: &str) -> StoreResult<()>;
    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>>;
    async fn sismember(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Append a flat field list to the stream at `key`, returning the
    /// assigned id (`<ms>-<seq>`) — the journal parses this back into a
    /// [`prowhey_core::JournalId`].
    async fn xadd(&self, key: &str, fields: &[(String, String)]) -> StoreResult<String>;
    async fn xrange(&self, key: &str, start: &str, end: &str) -> StoreResult<Vec<StreamRecord>>;
    async fn xlen(&self, key: &str) -> StoreResult<u64>;
    /// Trim the stream to at most `max_len` entries, evicting oldest first.
    async fn xtrim(&self, key: &str, max_len: u64) -> StoreResult<u64>;
    /// Evict every entry with an id strictly less than `min_id` (`XTRIM ...
    /// MINID`), the age-based counterpart to [`Self::xtrim`]'s count-based
    /// eviction.
    async fn xtrim_before(&self, key: &str, min_id: &str) -> StoreResult<u64>;

    /// Non-blocking scan for keys matching `pattern` (glob-style, as Redis
    /// interprets it). Used only by the reconciler, never on a hot path.
    async fn scan_keys(&self, pattern: &str) -> StoreResult<Vec<String>>;
}
