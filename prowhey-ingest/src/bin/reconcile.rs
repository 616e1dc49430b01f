//! Rebuilds the `non_registered`/`province`/`city` secondary indexes from
//! the current user cache (SPEC_FULL.md §4.9.2). Run after a journal-only
//! restore, or whenever the indexes are suspected to have drifted.

use std::sync::Arc;

use prowhey_core::{CachedEntity, EntityPayload, EntityType};
use prowhey_ingest::IngestResult;
use prowhey_store::{KvStreamStore, RedisStore, SecondaryIndexes};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    match run().await {
        Ok(count) => {
            tracing::info!(users_indexed = count, "reconcile complete");
        }
        Err(e) => {
            tracing::error!(error = %e, "reconcile failed");
            std::process::exit(1);
        }
    }
}

async fn run() -> IngestResult<usize> {
    let redis_url = std::env::var("PROWHEY_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1".to_string());
    let store: Arc<dyn KvStreamStore> = Arc::new(RedisStore::connect(&redis_url).await?);
    let indexes = SecondaryIndexes::new(store.clone());

    let prefix = format!("hash:{}:", EntityType::User.as_str());
    let keys = store.scan_keys(&format!("{prefix}*")).await?;

    let mut users = Vec::new();
    for key in keys {
        let Some(raw) = store.get(&key).await? else {
            continue;
        };
        let entity: CachedEntity = serde_json::from_str(&raw)?;
        if entity.is_tombstone() {
            continue;
        }
        if let Some(EntityPayload::User(payload)) = entity.payload {
            users.push((entity.entity_id.to_string(), payload));
        }
    }

    let count = users.len();
    indexes.rebuild(&users).await?;
    Ok(count)
}
