//! ERP ingest: fetching raw records, transforming them into app-ready
//! payloads, running them through the change detector, and scheduling the
//! periodic sync tiers and full refresh.

mod erp_client;
mod error;
mod scheduler;
mod sync_processor;
mod transformer;

pub use erp_client::{ErpClient, RawRecord, ReqwestErpClient};
pub use error::{IngestError, IngestResult};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use sync_processor::{SyncProcessor, SyncSummary};
pub use transformer::{JsonTransformer, Transformer};

#[cfg(test)]
pub use erp_client::mock::MockErpClient;
