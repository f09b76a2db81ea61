//! Entity Query Endpoints
//!
//! Read-only access to indexed entities for downstream consumers. Each entity
//! is returned as a flat JSON object: its schema fields under their ABI names
//! plus `id`, `blockNumber`, `blockTimestamp`, `transactionHash` and
//! `__typename`. Integers and addresses are strings.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::indexing::Entity;
use crate::schema;
use crate::store::{
    EntityQuery, FieldFilter, OrderDirection, OrderKey, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use crate::AppState;

// ============ Request/Response Types ============

/// 목록 쿼리 파라미터
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// 페이지 크기 (기본 100, 최대 1000)
    pub first: Option<u32>,
    pub skip: Option<u32>,
    /// `id` | `blockNumber` | `blockTimestamp` | `transactionHash` | 필드 이름
    pub order_by: Option<String>,
    /// `asc` | `desc`
    pub order_direction: Option<String>,
    pub id_prefix: Option<String>,
    /// `field` + `equals`: 필드 동등 조건
    pub field: Option<String>,
    pub equals: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntityListResponse {
    pub entity_type: String,
    pub entities: Vec<serde_json::Value>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub first: u32,
    pub skip: u32,
    pub total: u64,
    pub has_next: bool,
}

// ============ Handlers ============

/// GET /entities/:entity_type
///
/// # Response
///
/// ```json
/// {
///   "entity_type": "BidPlaced",
///   "entities": [
///     {
///       "__typename": "BidPlaced",
///       "id": "0xa160...2a-1",
///       "auctionId": "1",
///       "bidder": "0x90cb...",
///       "amount": "250",
///       "staked": true,
///       "blockNumber": "1",
///       "blockTimestamp": "1",
///       "transactionHash": "0xa160...2a"
///     }
///   ],
///   "pagination": { "first": 100, "skip": 0, "total": 1, "has_next": false }
/// }
/// ```
pub async fn list_entities(
    State(state): State<AppState>,
    Path(entity_type): Path<String>,
    Query(params): Query<ListQuery>,
) -> Result<Json<EntityListResponse>, ApiError> {
    let query = build_query(&entity_type, params)?;

    let total = state.store.count(&query).await?;
    let entities = state.store.query(&query).await?;

    Ok(Json(EntityListResponse {
        entity_type,
        entities: entities.iter().map(entity_json).collect(),
        pagination: Pagination {
            first: query.first,
            skip: query.skip,
            total,
            has_next: u64::from(query.skip) + u64::from(query.first) < total,
        },
    }))
}

/// GET /entities/:entity_type/:id
pub async fn get_entity(
    State(state): State<AppState>,
    Path((entity_type, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    ensure_entity_type(&entity_type)?;

    let entity = state
        .store
        .get(&entity_type, &id.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} {}", entity_type, id)))?;

    Ok(Json(entity_json(&entity)))
}

// ============ Helper Functions ============

fn ensure_entity_type(entity_type: &str) -> Result<(), ApiError> {
    if schema::entity_types().contains(entity_type) {
        Ok(())
    } else {
        Err(ApiError::NotFound(format!("Entity type {}", entity_type)))
    }
}

fn build_query(entity_type: &str, params: ListQuery) -> Result<EntityQuery, ApiError> {
    ensure_entity_type(entity_type)?;

    let first = params.first.unwrap_or(DEFAULT_PAGE_SIZE);
    if first > MAX_PAGE_SIZE {
        return Err(ApiError::ValidationError(format!(
            "first must be at most {}",
            MAX_PAGE_SIZE
        )));
    }

    let order_by = match params.order_by.as_deref() {
        Some(name) => OrderKey::parse(entity_type, name).map_err(ApiError::ValidationError)?,
        None => OrderKey::Chain,
    };
    let direction = match params.order_direction.as_deref() {
        Some(dir) => OrderDirection::parse(dir).map_err(ApiError::ValidationError)?,
        None => OrderDirection::Asc,
    };

    let mut query = EntityQuery::new(entity_type)
        .first(first)
        .skip(params.skip.unwrap_or(0))
        .order_by(order_by, direction);

    if let Some(prefix) = params.id_prefix {
        query = query.id_prefix(prefix.to_lowercase());
    }

    match (params.field, params.equals) {
        (Some(field), Some(equals)) => {
            let filter = FieldFilter::parse(entity_type, &field, &equals)
                .map_err(ApiError::ValidationError)?;
            query = query.filter(filter);
        }
        (None, None) => {}
        _ => {
            return Err(ApiError::ValidationError(
                "field and equals must be given together".to_string(),
            ))
        }
    }

    Ok(query)
}

/// 조회 응답용 평탄화 JSON
pub fn entity_json(entity: &Entity) -> serde_json::Value {
    let mut object = entity.fields_json();
    object.insert("__typename".into(), entity.entity_type.clone().into());
    object.insert("id".into(), entity.id.clone().into());
    object.insert("blockNumber".into(), entity.block_number.to_string().into());
    object.insert("blockTimestamp".into(), entity.block_timestamp.to_string().into());
    object.insert("transactionHash".into(), entity.transaction_hash_hex().into());
    serde_json::Value::Object(object)
}
