//! ERP client interface (spec.md §4.6). ERPNext's actual document schema
//! and authentication scheme are out of scope (spec Non-goals); this crate
//! only needs to fetch a `Doctype`'s records as raw JSON and hand them to
//! the [`crate::transformer::Transformer`].

use async_trait::async_trait;
use prowhey_core::EntityType;
use serde_json::Value;

use crate::error::{IngestError, IngestResult};

/// One raw record as returned by the ERP, paired with its entity id.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub entity_id: String,
    pub data: Value,
}

#[async_trait]
pub trait ErpClient: Send + Sync {
    /// Fetch every live record of `entity_type` — the full-refresh path
    /// (spec.md §4.6, weekly full refresh).
    async fn fetch_all(&self, entity_type: EntityType) -> IngestResult<Vec<RawRecord>>;

    /// Fetch one record by id — the webhook and read-through paths.
    async fn fetch_one(&self, entity_type: EntityType, entity_id: &str) -> IngestResult<Option<RawRecord>>;

    /// Cheap reachability probe for `GET /health`'s `components.erp` field.
    /// Default is a no-op success; [`ReqwestErpClient`] overrides it with an
    /// actual round trip.
    async fn health_check(&self) -> IngestResult<()> {
        Ok(())
    }
}

/// Generic REST client: `GET {base_url}/{doctype}` for a full listing,
/// `GET {base_url}/{doctype}/{id}` for one record. ERPNext's REST API
/// follows this shape closely enough to stand in for it without coupling
/// this crate to its specific authentication or field-naming conventions.
pub struct ReqwestErpClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl ReqwestErpClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    fn auth_header(&self) -> String {
        format!("token {}:{}", self.api_key, self.api_secret)
    }
}

#[async_trait]
impl ErpClient for ReqwestErpClient {
    async fn fetch_all(&self, entity_type: EntityType) -> IngestResult<Vec<RawRecord>> {
        let url = format!("{}/api/resource/{}", self.base_url, entity_type.as_str());
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| IngestError::ErpRequest(e.to_string()))?
            .error_for_status()
            .map_err(|e| IngestError::ErpRequest(e.to_string()))?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| IngestError::ErpRequest(e.to_string()))?;
        let items = body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(items
            .into_iter()
            .filter_map(|data| {
                let id = data.get("name").and_then(Value::as_str)?.to_string();
                Some(RawRecord { entity_id: id, data })
            })
            .collect())
    }

    async fn fetch_one(&self, entity_type: EntityType, entity_id: &str) -> IngestResult<Option<RawRecord>> {
        let url = format!(
            "{}/api/resource/{}/{}",
            self.base_url,
            entity_type.as_str(),
            entity_id
        );
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| IngestError::ErpRequest(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: Value = response
            .error_for_status()
            .map_err(|e| IngestError::ErpRequest(e.to_string()))?
            .json()
            .await
            .map_err(|e| IngestError::ErpRequest(e.to_string()))?;
        let data = body.get("data").cloned().unwrap_or(body);
        Ok(Some(RawRecord {
            entity_id: entity_id.to_string(),
            data,
        }))
    }

    async fn health_check(&self) -> IngestResult<()> {
        self.client
            .get(&self.base_url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| IngestError::ErpRequest(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use super::*;

    /// An in-memory ERP stand-in for tests: entity type -> (entity id -> raw record).
    #[derive(Default)]
    pub struct MockErpClient {
        records: RwLock<HashMap<EntityType, HashMap<String, Value>>>,
    }

    impl MockErpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn put(&self, entity_type: EntityType, entity_id: &str, data: Value) {
            self.records
                .write()
                .unwrap()
                .entry(entity_type)
                .or_default()
                .insert(entity_id.to_string(), data);
        }

        pub fn remove(&self, entity_type: EntityType, entity_id: &str) {
            if let Some(m) = self.records.write().unwrap().get_mut(&entity_type) {
                m.remove(entity_id);
            }
        }
    }

    #[async_trait]
    impl ErpClient for MockErpClient {
        async fn fetch_all(&self, entity_type: EntityType) -> IngestResult<Vec<RawRecord>> {
            Ok(self
                .records
                .read()
                .unwrap()
                .get(&entity_type)
                .map(|m| {
                    m.iter()
                        .map(|(id, data)| RawRecord {
                            entity_id: id.clone(),
                            data: data.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn fetch_one(&self, entity_type: EntityType, entity_id: &str) -> IngestResult<Option<RawRecord>> {
            Ok(self
                .records
                .read()
                .unwrap()
                .get(&entity_type)
                .and_then(|m| m.get(entity_id))
                .map(|data| RawRecord {
                    entity_id: entity_id.to_string(),
                    data: data.clone(),
                }))
        }
    }
}
