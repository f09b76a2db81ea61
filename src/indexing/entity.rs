//! Indexed entity record.

use ethers::types::{Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::types::{to_hex, Value};

/// 엔티티 필드 (스키마 순서 유지)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

/// 저장 단위 엔티티
///
/// 한 번 생성되면 수정/삭제되지 않는다. "현재 상태"는 같은 키의 엔티티 중
/// `(block_number, log_index)`가 가장 큰 것.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub entity_type: String,
    pub id: String,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub transaction_hash: Bytes,
    /// 체인 순서 정렬용 (ID에 이미 포함)
    pub log_index: u64,
    pub fields: Vec<Field>,
}

impl Entity {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    /// 봉투 필드까지 포함한 값 조회 (정렬/필터 공용)
    pub fn value_of(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.clone())),
            "blockNumber" => Some(Value::BigInt(U256::from(self.block_number))),
            "blockTimestamp" => Some(Value::BigInt(U256::from(self.block_timestamp))),
            "transactionHash" => Some(Value::Bytes(self.transaction_hash.clone())),
            _ => self.get(name).cloned(),
        }
    }

    /// 필드의 텍스트 표현 (필터 비교 기준)
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.value_of(name).map(|v| v.to_string())
    }

    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }

    pub fn transaction_hash_hex(&self) -> String {
        to_hex(&self.transaction_hash)
    }

    /// 조회 응답용 필드 맵
    pub fn fields_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.value.to_json()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::fixtures::mock_tx_hash;

    fn entity() -> Entity {
        Entity {
            entity_type: "TokenLocked".to_string(),
            id: "0xa16081f360e3847006db660bae1c6d1b2e17ec2a-1".to_string(),
            block_number: 12,
            block_timestamp: 1_700_000_000,
            transaction_hash: mock_tx_hash(),
            log_index: 0,
            fields: vec![
                Field {
                    name: "tokenId".to_string(),
                    value: Value::BigInt(U256::from(5)),
                },
                Field {
                    name: "locked".to_string(),
                    value: Value::Bool(true),
                },
            ],
        }
    }

    #[test]
    fn test_field_text() {
        let e = entity();
        assert_eq!(e.field_text("tokenId").as_deref(), Some("5"));
        assert_eq!(e.field_text("locked").as_deref(), Some("true"));
        assert_eq!(e.field_text("blockNumber").as_deref(), Some("12"));
        assert_eq!(
            e.field_text("transactionHash").as_deref(),
            Some("0xa16081f360e3847006db660bae1c6d1b2e17ec2a")
        );
        assert!(e.field_text("missing").is_none());
    }

    #[test]
    fn test_fields_json() {
        let json = entity().fields_json();
        assert_eq!(json["tokenId"], serde_json::json!("5"));
        assert_eq!(json["locked"], serde_json::json!(true));
    }
}
