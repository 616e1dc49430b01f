//! Shared error type for pure, in-crate failures.
//!
//! Store, ingest, and API errors each get their own enum in their own
//! crate; this one only covers what `prowhey-core` itself can fail at —
//! hashing and (de)serialization of the payload types it defines.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
