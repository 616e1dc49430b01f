//! Shared application state for Axum routers.

use std::sync::Arc;

use prowhey_ingest::{ErpClient, SyncProcessor};
use prowhey_store::{AudienceFilter, ChangeDetector, ChangeJournal, KvStreamStore, SecondaryIndexes, TransformedCache};

use crate::config::ApiConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStreamStore>,
    pub cache: Arc<TransformedCache>,
    pub journal: Arc<ChangeJournal>,
    pub detector: Arc<ChangeDetector>,
    pub indexes: Arc<SecondaryIndexes>,
    pub audience_filter: Arc<AudienceFilter>,
    pub sync_processor: Arc<SyncProcessor>,
    pub erp: Arc<dyn ErpClient>,
    pub config: Arc<ApiConfig>,
    pub start_time: std::time::Instant,
}

crate::impl_from_ref!(Arc<dyn KvStreamStore>, store);
crate::impl_from_ref!(Arc<TransformedCache>, cache);
crate::impl_from_ref!(Arc<ChangeJournal>, journal);
crate::impl_from_ref!(Arc<ChangeDetector>, detector);
crate::impl_from_ref!(Arc<SecondaryIndexes>, indexes);
crate::impl_from_ref!(Arc<AudienceFilter>, audience_filter);
crate::impl_from_ref!(Arc<SyncProcessor>, sync_processor);
crate::impl_from_ref!(Arc<dyn ErpClient>, erp);
crate::impl_from_ref!(Arc<ApiConfig>, config);
crate::impl_from_ref!(std::time::Instant, start_time);
