//! Prowhey API server entry point.
//!
//! Bootstraps config and telemetry, connects the store, wires the ingest
//! stack, spawns the scheduler alongside the HTTP server, and shuts both
//! down together on a termination signal.

use std::net::SocketAddr;
use std::sync::Arc;

use prowhey_api::{create_api_router, ApiConfig, ApiError, AppState};
use prowhey_api::telemetry::{init_logging, TelemetryConfig};
use prowhey_ingest::{JsonTransformer, ReqwestErpClient, Scheduler, SchedulerConfig, SyncProcessor};
use prowhey_store::{AudienceFilter, ChangeDetector, ChangeJournal, RedisStore, SecondaryIndexes, TransformedCache};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let telemetry_config = TelemetryConfig::from_env();
    init_logging(&telemetry_config);

    let config = ApiConfig::from_env();

    let store = Arc::new(
        RedisStore::connect(&config.store_url())
            .await
            .map_err(|e| ApiError::internal(format!("failed to connect to store: {e}")))?,
    );

    let erp = Arc::new(ReqwestErpClient::new(
        config.erp_base_url.clone(),
        config.erp_api_key.clone(),
        config.erp_api_secret.clone(),
    ));
    let transformer = Arc::new(JsonTransformer);
    let sync_processor = Arc::new(SyncProcessor::new(erp.clone(), transformer, store.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(sync_processor.clone(), store.clone(), SchedulerConfig::from_env());
    let scheduler_handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    let state = AppState {
        cache: Arc::new(TransformedCache::new(store.clone())),
        journal: Arc::new(ChangeJournal::new(store.clone())),
        detector: Arc::new(ChangeDetector::new(store.clone())),
        indexes: Arc::new(SecondaryIndexes::new(store.clone())),
        audience_filter: Arc::new(AudienceFilter),
        sync_processor,
        erp,
        store,
        config: Arc::new(config.clone()),
        start_time: std::time::Instant::now(),
    };

    let app = create_api_router(state);

    let addr = resolve_bind_addr(&config)?;
    tracing::info!(%addr, "starting prowhey-api server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal(format!("failed to bind {addr}: {e}")))?;

    let server = axum::serve(listener, app.into_make_service());
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal(format!("server error: {e}")))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = scheduler_handle.await;

    Ok(())
}

fn resolve_bind_addr(config: &ApiConfig) -> Result<SocketAddr, ApiError> {
    let addr = format!("{}:{}", config.bind_host, config.bind_port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::validation(format!("invalid bind address {addr}: {e}")))
}
