//! Mapping Function
//!
//! One generic transform for every event kind: decoded event in, exactly one
//! entity out. Parameters are copied in schema order under their ABI names,
//! followed by the block/transaction envelope. The only transform is the
//! string coercion declared on `BrandNFTMinted.brandName`.

use crate::error::DecodeError;
use crate::indexing::decoder::{decode, DecodedEvent};
use crate::indexing::entity::{Entity, Field};
use crate::indexing::event::RawEvent;
use crate::schema::FieldTransform;
use crate::types::{to_hex, Value};

pub fn map_event(decoded: DecodedEvent) -> Entity {
    let schema = decoded.schema;

    let fields = schema
        .params
        .iter()
        .zip(decoded.params)
        .map(|(spec, value)| Field {
            name: spec.name.to_string(),
            value: apply(spec.transform, value),
        })
        .collect();

    Entity {
        entity_type: schema.entity.to_string(),
        id: decoded.id.to_string(),
        block_number: decoded.block.number,
        block_timestamp: decoded.block.timestamp,
        transaction_hash: decoded.transaction_hash,
        log_index: decoded.log_index,
        fields,
    }
}

/// decode + map
pub fn handle_event(raw: &RawEvent) -> Result<Entity, DecodeError> {
    decode(raw).map(map_event)
}

fn apply(transform: FieldTransform, value: Value) -> Value {
    match transform {
        FieldTransform::Identity => value,
        FieldTransform::ToString => coerce_to_string(value),
    }
}

/// indexed string은 topic 해시 bytes로 들어온다. UTF-8이면 그대로, 아니면 hex.
fn coerce_to_string(value: Value) -> Value {
    match value {
        Value::String(_) => value,
        Value::Bytes(bytes) => {
            let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
            match std::str::from_utf8(&bytes[..end]) {
                Ok(s) if !s.is_empty() && !s.chars().any(char::is_control) => {
                    Value::String(s.to_string())
                }
                _ => Value::String(to_hex(&bytes)),
            }
        }
        other => Value::String(other.to_string()),
    }
}
