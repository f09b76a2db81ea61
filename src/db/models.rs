//! Database Models
//!
//! Row types for the `entities` table. Entity fields live in a JSONB object
//! keyed by field name; each value carries its type tag (see `StoredValue`).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::error::StoreError;
use crate::indexing::{Entity, Field};
use crate::schema;
use crate::types::{from_hex, Value};

/// `entities` 테이블 행
#[derive(Debug, Clone, FromRow)]
pub struct EntityRow {
    /// 이벤트 이름과 동일 (`BidPlaced` 등)
    pub entity_type: String,

    /// `<txHash>-<logIndex + 1>`
    pub id: String,

    pub block_number: i64,

    /// unix seconds
    pub block_timestamp: i64,

    /// lowercase `0x` hex
    pub transaction_hash: String,

    pub log_index: i64,

    /// 필드 이름 → 태그된 값
    pub fields: Json<BTreeMap<String, Value>>,

    /// 인덱서가 행을 기록한 시각
    pub indexed_at: DateTime<Utc>,
}

impl TryFrom<EntityRow> for Entity {
    type Error = StoreError;

    /// JSONB는 키 순서를 보존하지 않으므로 스키마 순서로 재정렬한다.
    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        let specs = schema::entity_fields(&row.entity_type)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown entity type {}", row.entity_type)))?;

        let mut values = row.fields.0;
        let fields = specs
            .iter()
            .map(|spec| {
                values
                    .remove(spec.name)
                    .map(|value| Field {
                        name: spec.name.to_string(),
                        value,
                    })
                    .ok_or_else(|| {
                        StoreError::Corrupt(format!("{}/{} missing field {}", row.entity_type, row.id, spec.name))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(extra) = values.keys().next() {
            return Err(StoreError::Corrupt(format!(
                "{}/{} has unexpected field {}",
                row.entity_type, row.id, extra
            )));
        }

        let unsigned = |v: i64, what: &str| {
            u64::try_from(v).map_err(|_| StoreError::Corrupt(format!("negative {} {}", what, v)))
        };

        Ok(Entity {
            block_number: unsigned(row.block_number, "block number")?,
            block_timestamp: unsigned(row.block_timestamp, "block timestamp")?,
            log_index: unsigned(row.log_index, "log index")?,
            transaction_hash: from_hex(&row.transaction_hash).map_err(StoreError::Corrupt)?,
            entity_type: row.entity_type,
            id: row.id,
            fields,
        })
    }
}

/// 저장용 JSONB 객체
pub fn fields_document(entity: &Entity) -> Result<serde_json::Value, StoreError> {
    let map: BTreeMap<&str, &Value> = entity
        .fields
        .iter()
        .map(|f| (f.name.as_str(), &f.value))
        .collect();
    Ok(serde_json::to_value(map)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::fixtures::*;
    use crate::indexing::handle_event;

    fn row_for(entity: &Entity) -> EntityRow {
        let document = fields_document(entity).unwrap();
        EntityRow {
            entity_type: entity.entity_type.clone(),
            id: entity.id.clone(),
            block_number: entity.block_number as i64,
            block_timestamp: entity.block_timestamp as i64,
            transaction_hash: entity.transaction_hash_hex(),
            log_index: entity.log_index as i64,
            fields: Json(serde_json::from_value(document).unwrap()),
            indexed_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_restores_schema_order() {
        let entity = handle_event(&auction_created()).unwrap();
        let restored = Entity::try_from(row_for(&entity)).unwrap();
        assert_eq!(restored, entity);
    }

    #[test]
    fn test_missing_field_is_corrupt() {
        let entity = handle_event(&auction_created()).unwrap();
        let mut row = row_for(&entity);
        row.fields.0.remove("endTime");
        assert!(matches!(Entity::try_from(row), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_document_is_tagged() {
        let entity = handle_event(&bid_placed(3, "0x90cba2bbb19ecc291a12066fd8329d65fa1f1947", 42, 0)).unwrap();
        let document = fields_document(&entity).unwrap();
        assert_eq!(document["amount"], serde_json::json!({ "type": "BigInt", "value": "42" }));
        assert_eq!(document["staked"], serde_json::json!({ "type": "Bool", "value": true }));
    }
}
