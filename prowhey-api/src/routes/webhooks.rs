//! `POST /api/webhooks/erpnext` (spec.md §4.6, §6).
//!
//! No signature verification: the spec's Non-goals explicitly exclude
//! authentication, and §6 doesn't describe a signature header for this
//! endpoint.

use axum::{extract::State, routing::post, Json, Router};
use prowhey_core::EntityType;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub entity_type: EntityType,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unchanged: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<usize>,
}

/// Dispatches to a single-entity sync when `entity_id` is present, or a
/// full-type sync otherwise (spec.md §4.6 covers `hero`/`bundle`/`home`
/// arriving list-shaped with no single id).
pub async fn erpnext(
    State(state): State<AppState>,
    Json(body): Json<WebhookPayload>,
) -> ApiResult<Json<WebhookResponse>> {
    match body.entity_id {
        Some(entity_id) => {
            let summary = state
                .sync_processor
                .sync_one(body.entity_type, &entity_id, body.idempotency_key)
                .await?;
            Ok(Json(match summary {
                Some(s) => WebhookResponse {
                    accepted: true,
                    created: Some(s.created),
                    updated: Some(s.updated),
                    unchanged: Some(s.unchanged),
                    deleted: Some(s.deleted),
                },
                None => WebhookResponse { accepted: true, created: None, updated: None, unchanged: None, deleted: None },
            }))
        }
        None => {
            let summary = state.sync_processor.sync_entity_type(body.entity_type).await?;
            Ok(Json(WebhookResponse {
                accepted: true,
                created: Some(summary.created),
                updated: Some(summary.updated),
                unchanged: Some(summary.unchanged),
                deleted: Some(summary.deleted),
            }))
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/erpnext", post(erpnext))
}
