//! Common Types Module
//!
//! 인덱서 전반에서 사용되는 공통 타입 정의
//!
//! - `Value`: 엔티티 필드 값 (ABI 타입별)
//! - `EntityId`: `(transactionHash, logIndex)` 복합 키

use std::cmp::Ordering;
use std::fmt;

use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// 엔티티 필드 값
///
/// 텍스트 표현(`Display`)이 조회 API와 필터 비교의 기준이다.
///
/// | 타입 | 표현 |
/// |------|------|
/// | BigInt | 10진수 (`234`) |
/// | Address | 소문자 `0x` hex |
/// | Bytes | 소문자 `0x` hex |
/// | String | 그대로 |
/// | Bool | `true` / `false` |
/// | Array | `[a, b]` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "StoredValue", try_from = "StoredValue")]
pub enum Value {
    BigInt(U256),
    Address(Address),
    Bytes(Bytes),
    String(String),
    Bool(bool),
    Array(Vec<Value>),
}

impl Value {
    /// 조회 응답용 JSON (GraphQL 스타일: 정수/주소는 문자열)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            other => serde_json::Value::String(other.to_string()),
        }
    }

    /// 정렬용 비교. 같은 타입끼리는 타입 의미대로, 나머지는 텍스트 비교.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::BigInt(a), Value::BigInt(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Address(a), Value::Address(b)) => a.cmp(b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Address(a) => write!(f, "{:#x}", a),
            Value::Bytes(b) => f.write_str(&to_hex(b)),
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// 저장 포맷 (JSONB)
///
/// 타입 태그를 함께 저장해야 재조회 시 `Value`가 그대로 복원된다.
/// 정수는 10진 문자열로 저장 → SQL에서 `::numeric` 캐스팅 가능.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum StoredValue {
    BigInt(String),
    Address(String),
    Bytes(String),
    String(String),
    Bool(bool),
    Array(Vec<StoredValue>),
}

impl From<Value> for StoredValue {
    fn from(value: Value) -> Self {
        match value {
            Value::BigInt(v) => StoredValue::BigInt(v.to_string()),
            Value::Address(a) => StoredValue::Address(format!("{:#x}", a)),
            Value::Bytes(b) => StoredValue::Bytes(to_hex(&b)),
            Value::String(s) => StoredValue::String(s),
            Value::Bool(b) => StoredValue::Bool(b),
            Value::Array(items) => {
                StoredValue::Array(items.into_iter().map(StoredValue::from).collect())
            }
        }
    }
}

impl TryFrom<StoredValue> for Value {
    type Error = String;

    fn try_from(stored: StoredValue) -> Result<Self, Self::Error> {
        Ok(match stored {
            StoredValue::BigInt(s) => Value::BigInt(
                U256::from_dec_str(&s).map_err(|e| format!("invalid integer {}: {}", s, e))?,
            ),
            StoredValue::Address(s) => Value::Address(
                s.parse::<Address>()
                    .map_err(|e| format!("invalid address {}: {}", s, e))?,
            ),
            StoredValue::Bytes(s) => Value::Bytes(from_hex(&s)?),
            StoredValue::String(s) => Value::String(s),
            StoredValue::Bool(b) => Value::Bool(b),
            StoredValue::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        })
    }
}

/// 엔티티 복합 키: 트랜잭션 해시 + 로그 인덱스
///
/// 텍스트 형태는 `<txHash>-<logIndex + 1>` 이다.
/// 같은 트랜잭션의 여러 이벤트도 서로 다른 ID를 갖는다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId {
    transaction_hash: Bytes,
    log_index: i32,
}

impl EntityId {
    /// 로그 인덱스는 32비트 정수에 들어가야 한다.
    pub fn new(transaction_hash: Bytes, log_index: u64) -> Result<Self, DecodeError> {
        let log_index =
            i32::try_from(log_index).map_err(|_| DecodeError::LogIndexOverflow(log_index))?;
        Ok(Self {
            transaction_hash,
            log_index,
        })
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            to_hex(&self.transaction_hash),
            i64::from(self.log_index) + 1
        )
    }
}

/// `0x` 접두사 소문자 hex
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// `0x` 접두사는 선택
pub fn from_hex(s: &str) -> Result<Bytes, String> {
    hex::decode(s.trim_start_matches("0x"))
        .map(Bytes::from)
        .map_err(|e| format!("invalid hex {}: {}", s, e))
}
