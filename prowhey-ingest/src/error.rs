use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("ERP request failed: {0}")]
    ErpRequest(String),

    #[error("ERP returned malformed data for {entity_type}/{entity_id}: {reason}")]
    Transform {
        entity_type: String,
        entity_id: String,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] prowhey_store::StoreError),

    #[error(transparent)]
    Core(#[from] prowhey_core::CoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;
