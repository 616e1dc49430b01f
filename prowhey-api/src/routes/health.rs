//! `GET /health` and `GET /health/sync-status` (spec.md §5, §6).
//!
//! `/health` always answers 200 — a degraded dependency is reported in the
//! body, not surfaced as a failing status code, so load balancers don't
//! yank the instance out of rotation over a transient store or ERP blip
//! (spec.md §5's graceful-degradation policy).

use std::collections::HashMap;
use std::time::Duration;

use axum::{extract::State, routing::get, Json, Router};
use prowhey_core::EntityType;
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

const STORE_DEADLINE: Duration = Duration::from_secs(2);
const ERP_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn ok(latency_ms: u64) -> Self {
        Self { status: HealthStatus::Healthy, latency_ms: Some(latency_ms), error: None }
    }

    fn down(error: String) -> Self {
        Self { status: HealthStatus::Unhealthy, latency_ms: None, error: Some(error) }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub uptime_seconds: u64,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthComponents {
    pub store: ComponentHealth,
    pub erp: ComponentHealth,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub components: HealthComponents,
    pub system: SystemInfo,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = check_store(&state).await;
    let erp = check_erp(&state).await;

    let overall = if store.status == HealthStatus::Healthy && erp.status == HealthStatus::Healthy {
        HealthStatus::Healthy
    } else if store.status == HealthStatus::Unhealthy {
        // The store is load-bearing for every request path; the ERP is
        // only consulted on sync/webhook ingest, so its outage degrades
        // rather than takes the whole service down.
        HealthStatus::Unhealthy
    } else {
        HealthStatus::Degraded
    };

    Json(HealthResponse {
        status: overall,
        components: HealthComponents { store, erp },
        system: SystemInfo {
            uptime_seconds: state.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    })
}

async fn check_store(state: &AppState) -> ComponentHealth {
    let start = std::time::Instant::now();
    match tokio::time::timeout(STORE_DEADLINE, state.store.get("health:ping")).await {
        Ok(Ok(_)) => ComponentHealth::ok(start.elapsed().as_millis() as u64),
        Ok(Err(e)) => ComponentHealth::down(e.to_string()),
        Err(_) => ComponentHealth::down("store health check timed out".into()),
    }
}

async fn check_erp(state: &AppState) -> ComponentHealth {
    let start = std::time::Instant::now();
    match tokio::time::timeout(ERP_DEADLINE, state.erp.health_check()).await {
        Ok(Ok(())) => ComponentHealth::ok(start.elapsed().as_millis() as u64),
        Ok(Err(e)) => ComponentHealth::down(e.to_string()),
        Err(_) => ComponentHealth::down("erp health check timed out".into()),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamStatus {
    pub length: u64,
    pub first_id: Option<String>,
    pub last_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatusResponse {
    pub streams: HashMap<&'static str, StreamStatus>,
}

/// Diagnostics-only: one `xlen` plus one `xrange` per journal. Not on any
/// hot path, so the extra round trip per entity type is acceptable.
pub async fn sync_status(State(state): State<AppState>) -> ApiResult<Json<SyncStatusResponse>> {
    let mut streams = HashMap::new();
    for entity_type in EntityType::ALL {
        let key = entity_type.journal_key();
        let length = state.store.xlen(&key).await?;
        let entries = state.store.xrange(&key, "-", "+").await?;
        streams.insert(
            entity_type.as_str(),
            StreamStatus {
                length,
                first_id: entries.first().map(|r| r.id.clone()),
                last_id: entries.last().map(|r| r.id.clone()),
            },
        );
    }
    Ok(Json(SyncStatusResponse { streams }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/sync-status", get(sync_status))
}
