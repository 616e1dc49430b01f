//! In-memory [`KvStreamStore`] used by tests across every crate in the
//! workspace, mirroring the production Redis semantics closely enough that
//! higher-level logic (cache, journal, detector, filter) can be tested
//! without a running Redis instance.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::kv::{KvStreamStore, StreamRecord};

#[derive(Debug, Default)]
struct Inner {
    strings: HashMap<String, String>,
    hashes: HashMap<String, HashMap<String, String>>,
    sets: HashMap<String, HashSet<String>>,
    streams: HashMap<String, BTreeMap<(u64, u64), Vec<(String, String)>>>,
    stream_seq: HashMap<String, (u64, u64)>,
}

/// A single-process, thread-safe stand-in for Redis.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(inner: &mut Inner, key: &str) -> (u64, u64) {
        let now_ms = inner.stream_seq.get(key).map(|(ms, _)| *ms).unwrap_or(0) + 1;
        let entry = inner.stream_seq.entry(key.to_string()).or_insert((0, 0));
        if entry.0 == now_ms {
            entry.1 += 1;
        } else {
            *entry = (now_ms, 0);
        }
        *entry
    }
}

#[async_trait]
impl KvStreamStore for InMemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.inner.read().unwrap().strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner
            .write()
            .unwrap()
            .strings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, _ttl_seconds: u64) -> StoreResult<()> {
        self.set(key, value).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().unwrap();
        inner.strings.remove(key);
        inner.hashes.remove(key);
        inner.sets.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        let mut inner = self.inner.write().unwrap();
        let entry = inner.strings.entry(key.to_string()).or_insert_with(|| "0".to_string());
        let value: i64 = entry.parse().unwrap_or(0) + 1;
        *entry = value.to_string();
        Ok(value)
    }

    async fn expire(&self, _key: &str, _ttl_seconds: u64) -> StoreResult<()> {
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> StoreResult<Vec<(String, String)>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .hashes
            .get(key)
            .map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.inner
            .write()
            .unwrap()
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> StoreResult<()> {
        if let Some(h) = self.inner.write().unwrap().hashes.get_mut(key) {
            h.remove(field);
        }
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()> {
        self.inner
            .write()
            .unwrap()
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> StoreResult<()> {
        if let Some(s) = self.inner.write().unwrap().sets.get_mut(key) {
            s.remove(member);
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn sismember(&self, key: &str, member: &str) -> StoreResult<bool> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .sets
            .get(key)
            .map(|s| s.contains(member))
            .unwrap_or(false))
    }

    async fn xadd(&self, key: &str, fields: &[(String, String)]) -> StoreResult<String> {
        let mut inner = self.inner.write().unwrap();
        let id = Self::next_id(&mut inner, key);
        inner
            .streams
            .entry(key.to_string())
            .or_default()
            .insert(id, fields.to_vec());
        Ok(format!("{}-{}", id.0, id.1))
    }

    async fn xrange(&self, key: &str, start: &str, end: &str) -> StoreResult<Vec<StreamRecord>> {
        let inner = self.inner.read().unwrap();
        let Some(stream) = inner.streams.get(key) else {
            return Ok(Vec::new());
        };
        let lo = parse_id(start, (0, 0));
        let hi = parse_id(end, (u64::MAX, u64::MAX));
        Ok(stream
            .range(lo..=hi)
            .map(|((ms, seq), fields)| StreamRecord {
                id: format!("{}-{}", ms, seq),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn xlen(&self, key: &str) -> StoreResult<u64> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .streams
            .get(key)
            .map(|s| s.len() as u64)
            .unwrap_or(0))
    }

    async fn xtrim(&self, key: &str, max_len: u64) -> StoreResult<u64> {
        let mut inner = self.inner.write().unwrap();
        let Some(stream) = inner.streams.get_mut(key) else {
            return Ok(0);
        };
        let overflow = stream.len().saturating_sub(max_len as usize);
        let keys_to_drop: Vec<_> = stream.keys().take(overflow).cloned().collect();
        for k in &keys_to_drop {
            stream.remove(k);
        }
        Ok(keys_to_drop.len() as u64)
    }

    async fn xtrim_before(&self, key: &str, min_id: &str) -> StoreResult<u64> {
        let cutoff = parse_id(min_id, (0, 0));
        let mut inner = self.inner.write().unwrap();
        let Some(stream) = inner.streams.get_mut(key) else {
            return Ok(0);
        };
        let keys_to_drop: Vec<_> = stream.range(..cutoff).map(|(id, _)| *id).collect();
        for k in &keys_to_drop {
            stream.remove(k);
        }
        Ok(keys_to_drop.len() as u64)
    }

    async fn scan_keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let inner = self.inner.read().unwrap();
        let prefix = pattern.trim_end_matches('*');
        Ok(inner
            .strings
            .keys()
            .chain(inner.hashes.keys())
            .chain(inner.sets.keys())
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect())
    }
}

/// Parses a stream id string (`<ms>-<seq>`, a bare ms, `-`, or `+`) into the
/// `(ms, seq)` pair the in-memory stream is keyed on.
fn parse_id(s: &str, default: (u64, u64)) -> (u64, u64) {
    if s == "-" || s == "0" {
        (0, 0)
    } else if s == "+" {
        (u64::MAX, u64::MAX)
    } else if let Some((ms, seq)) = s.split_once('-') {
        match (ms.parse(), seq.parse()) {
            (Ok(ms), Ok(seq)) => (ms, seq),
            _ => default,
        }
    } else {
        s.parse().map(|ms| (ms, 0)).unwrap_or(default)
    }
}
