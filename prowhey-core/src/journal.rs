//! Journal entry identity and the per-client cursor map (spec.md §3).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::EntityType;
use crate::payload::TargetSet;

/// A journal entry id of the form `<ms>-<seq>`, totally ordered within one
/// journal. Mirrors the stream-id shape a Redis stream assigns to `XADD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JournalId {
    pub ms: u64,
    pub seq: u64,
}

impl JournalId {
    /// The pseudo-id denoting "read from earliest".
    pub const ZERO: JournalId = JournalId { ms: 0, seq: 0 };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }
}

impl PartialOrd for JournalId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JournalId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.ms, self.seq).cmp(&(other.ms, other.seq))
    }
}

impl fmt::Display for JournalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// Error returned when a journal id string doesn't parse as `<ms>-<seq>`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid journal id: {0}")]
pub struct InvalidJournalId(pub String);

impl FromStr for JournalId {
    type Err = InvalidJournalId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ms_part, seq_part) = s
            .split_once('-')
            .ok_or_else(|| InvalidJournalId(s.to_string()))?;
        let ms = ms_part
            .parse()
            .map_err(|_| InvalidJournalId(s.to_string()))?;
        let seq = seq_part
            .parse()
            .map_err(|_| InvalidJournalId(s.to_string()))?;
        Ok(JournalId { ms, seq })
    }
}

impl TryFrom<String> for JournalId {
    type Error = InvalidJournalId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JournalId> for String {
    fn from(id: JournalId) -> Self {
        id.to_string()
    }
}

/// An entry appended to `<entityType>_changes` (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JournalEntry {
    pub id: JournalId,
    pub entity_id: String,
    pub data_hash: String,
    pub version: i64,
    pub idempotency_key: Option<String>,
    pub prev_hash: Option<String>,
    /// Present only for `notification` entries (spec.md §3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetSet>,
}

/// A client's per-entity-type cursor map. Absence of a key means "from the
/// beginning"; [`JournalId::ZERO`] denotes the same thing explicitly.
pub type Cursor = HashMap<EntityType, JournalId>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_id_round_trips() {
        let id = JournalId::new(1700000000123, 4);
        let s = id.to_string();
        let parsed: JournalId = s.parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn journal_id_orders_by_ms_then_seq() {
        assert!(JournalId::new(1, 9) < JournalId::new(2, 0));
        assert!(JournalId::new(5, 0) < JournalId::new(5, 1));
    }

    #[test]
    fn zero_id_parses() {
        assert_eq!("0-0".parse::<JournalId>().unwrap(), JournalId::ZERO);
    }

    #[test]
    fn malformed_id_is_rejected() {
        assert!("not-an-id-at-all-nope".parse::<JournalId>().is_err());
        assert!("5".parse::<JournalId>().is_err());
    }
}
