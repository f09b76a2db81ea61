//! Event Decoder
//!
//! Validates a raw event against its static schema and extracts a typed
//! parameter bag. Every mismatch (count, name, ABI type) is a `DecodeError`;
//! nothing is defaulted.

use ethers::abi::Token;
use ethers::types::{Bytes, U256};

use crate::error::DecodeError;
use crate::indexing::event::{BlockContext, RawEvent};
use crate::schema::{self, EventSchema, ParamKind, ParamSpec};
use crate::types::{EntityId, Value};

/// 스키마 검증을 통과한 이벤트
///
/// `params[i]`는 `schema.params[i]`에 대응한다.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub schema: &'static EventSchema,
    pub id: EntityId,
    pub block: BlockContext,
    pub transaction_hash: Bytes,
    pub log_index: u64,
    pub params: Vec<Value>,
}

/// `(contract, event)`로 스키마를 찾아 디코딩
pub fn decode(raw: &RawEvent) -> Result<DecodedEvent, DecodeError> {
    let schema = schema::find(raw.contract, &raw.event).ok_or_else(|| {
        DecodeError::UnknownEvent {
            contract: raw.contract.to_string(),
            event: raw.event.clone(),
        }
    })?;
    decode_with(schema, raw)
}

pub fn decode_with(
    schema: &'static EventSchema,
    raw: &RawEvent,
) -> Result<DecodedEvent, DecodeError> {
    if raw.params.len() != schema.params.len() {
        return Err(DecodeError::ParamCount {
            event: schema.name,
            expected: schema.params.len(),
            actual: raw.params.len(),
        });
    }

    let id = EntityId::new(raw.transaction_hash.clone(), raw.log_index)?;

    let params = schema
        .params
        .iter()
        .zip(&raw.params)
        .enumerate()
        .map(|(position, (spec, param))| {
            if param.name != spec.name {
                return Err(DecodeError::ParamName {
                    event: schema.name,
                    position,
                    expected: spec.name,
                    actual: param.name.clone(),
                });
            }
            decode_param(schema.name, spec, &param.value)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecodedEvent {
        schema,
        id,
        block: raw.block,
        transaction_hash: raw.transaction_hash.clone(),
        log_index: raw.log_index,
        params,
    })
}

fn decode_param(
    event: &'static str,
    spec: &'static ParamSpec,
    token: &Token,
) -> Result<Value, DecodeError> {
    // indexed 동적 타입은 topic 해시(bytes32)로만 전달된다
    if spec.indexed && spec.kind.is_dynamic() {
        if let Token::FixedBytes(hash) = token {
            if hash.len() == 32 {
                return Ok(Value::Bytes(Bytes::from(hash.clone())));
            }
        }
    }

    token_to_value(&spec.kind, token).ok_or_else(|| DecodeError::ParamType {
        event,
        param: spec.name,
        expected: spec.kind.canonical(),
        actual: token_kind(token),
    })
}

fn token_to_value(kind: &ParamKind, token: &Token) -> Option<Value> {
    match (kind, token) {
        (ParamKind::Uint(bits), Token::Uint(v)) => fits(v, *bits).then(|| Value::BigInt(*v)),
        (ParamKind::Address, Token::Address(a)) => Some(Value::Address(*a)),
        (ParamKind::FixedBytes(len), Token::FixedBytes(b)) if b.len() == *len => {
            Some(Value::Bytes(Bytes::from(b.clone())))
        }
        (ParamKind::String, Token::String(s)) => Some(Value::String(s.clone())),
        (ParamKind::Bool, Token::Bool(b)) => Some(Value::Bool(*b)),
        (ParamKind::Array(inner), Token::Array(items)) => items
            .iter()
            .map(|item| token_to_value(inner, item))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        _ => None,
    }
}

fn fits(v: &U256, bits: usize) -> bool {
    bits >= 256 || v.bits() <= bits
}

fn token_kind(token: &Token) -> String {
    match token {
        Token::Address(_) => "address".to_string(),
        Token::FixedBytes(b) => format!("bytes{}", b.len()),
        Token::Bytes(_) => "bytes".to_string(),
        Token::Int(_) => "int".to_string(),
        Token::Uint(v) => format!("uint ({} bits)", v.bits()),
        Token::Bool(_) => "bool".to_string(),
        Token::String(_) => "string".to_string(),
        Token::FixedArray(_) => "fixed array".to_string(),
        Token::Array(_) => "array".to_string(),
        Token::Tuple(_) => "tuple".to_string(),
    }
}
