//! Raw ERP JSON -> app-ready [`EntityPayload`] (spec.md §4.6).
//!
//! ERPNext's actual document field names are out of scope (spec
//! Non-goals); [`Transformer`] is the seam a real deployment would plug a
//! Doctype-aware mapping into. [`JsonTransformer`] assumes the raw record
//! is already shaped like the target payload and leans on `serde` to do
//! the validation, which is enough to exercise the rest of the pipeline.

use prowhey_core::EntityPayload;
use serde_json::Value;

use crate::error::{IngestError, IngestResult};
use crate::erp_client::RawRecord;
use prowhey_core::EntityType;

pub trait Transformer: Send + Sync {
    fn transform(&self, entity_type: EntityType, record: &RawRecord) -> IngestResult<EntityPayload>;
}

pub struct JsonTransformer;

impl Transformer for JsonTransformer {
    fn transform(&self, entity_type: EntityType, record: &RawRecord) -> IngestResult<EntityPayload> {
        let tagged = tag_with_entity_type(entity_type, record.data.clone());
        serde_json::from_value(tagged).map_err(|e| IngestError::Transform {
            entity_type: entity_type.to_string(),
            entity_id: record.entity_id.clone(),
            reason: e.to_string(),
        })
    }
}

fn tag_with_entity_type(entity_type: EntityType, mut data: Value) -> Value {
    if let Value::Object(map) = &mut data {
        map.insert(
            "entity_type".to_string(),
            Value::String(entity_type.as_str().to_string()),
        );
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transforms_well_formed_stock_record() {
        let record = RawRecord {
            entity_id: "sku-1".into(),
            data: json!({"quantity": 5, "warehouse": "RUH", "in_stock": true}),
        };
        let payload = JsonTransformer.transform(EntityType::Stock, &record).unwrap();
        assert_eq!(payload.entity_type(), EntityType::Stock);
    }

    #[test]
    fn rejects_malformed_record() {
        let record = RawRecord {
            entity_id: "sku-1".into(),
            data: json!({"warehouse": "RUH"}),
        };
        assert!(JsonTransformer.transform(EntityType::Stock, &record).is_err());
    }
}
