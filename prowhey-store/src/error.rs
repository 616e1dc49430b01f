//! Errors raised by the KV/stream store abstraction and the layers built on it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("store command failed: {0}")]
    Command(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] prowhey_core::CoreError),

    #[error("malformed journal id in stream entry: {0}")]
    MalformedJournalId(#[from] prowhey_core::InvalidJournalId),

    #[error("cache entry not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Command(e.to_string())
    }
}
