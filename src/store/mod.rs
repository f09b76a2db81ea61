//! Entity Store
//!
//! 엔티티 저장/조회 추상화
//!
//! ```text
//!                 ┌──────────────────────┐
//!  Indexer ──────▶│  dyn EntityStore     │◀────── Query API (routes)
//!                 └──────────┬───────────┘
//!                  ┌─────────┴─────────┐
//!                  ▼                   ▼
//!           db::Database         MemoryStore
//!           (PostgreSQL)         (dev / tests)
//! ```
//!
//! Entities are append-only. A given `(entity_type, id)` is written at most
//! once; writing identical content again is a no-op, writing different
//! content is `StoreError::DuplicateId`.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::indexing::Entity;
use crate::schema::{self, ParamKind};

/// 조회 기본 페이지 크기
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// 조회 최대 페이지 크기
pub const MAX_PAGE_SIZE: u32 = 1000;

// ============ Store Trait ============

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// 한 블록 분량의 엔티티와 체크포인트를 원자적으로 저장
    ///
    /// 하나라도 `DuplicateId`면 아무것도 반영되지 않는다.
    async fn save_batch(
        &self,
        entities: &[Entity],
        checkpoint: Option<u64>,
    ) -> Result<BatchOutcome, StoreError>;

    async fn save(&self, entity: &Entity) -> Result<SaveOutcome, StoreError> {
        let outcome = self
            .save_batch(std::slice::from_ref(entity), None)
            .await?;
        Ok(if outcome.inserted == 1 {
            SaveOutcome::Inserted
        } else {
            SaveOutcome::AlreadyStored
        })
    }

    async fn get(&self, entity_type: &str, id: &str) -> Result<Option<Entity>, StoreError>;

    async fn query(&self, query: &EntityQuery) -> Result<Vec<Entity>, StoreError>;

    /// 페이지네이션 무시, 조건에 맞는 전체 개수
    async fn count(&self, query: &EntityQuery) -> Result<u64, StoreError>;

    /// 마지막으로 완전히 처리된 블록
    async fn checkpoint(&self) -> Result<Option<u64>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    /// 같은 내용이 이미 저장됨 (재처리)
    AlreadyStored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub inserted: usize,
    pub unchanged: usize,
}

// ============ Query ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(OrderDirection::Asc),
            "desc" => Ok(OrderDirection::Desc),
            other => Err(format!("order_direction must be asc or desc, got {}", other)),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// 정렬 기준
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderKey {
    /// `(blockNumber, logIndex)` 체인 순서
    Chain,
    Id,
    BlockNumber,
    BlockTimestamp,
    TransactionHash,
    Field { name: String, numeric: bool },
}

impl OrderKey {
    pub fn parse(entity_type: &str, name: &str) -> Result<Self, String> {
        match name {
            "id" => Ok(OrderKey::Id),
            "blockNumber" => Ok(OrderKey::BlockNumber),
            "blockTimestamp" => Ok(OrderKey::BlockTimestamp),
            "transactionHash" => Ok(OrderKey::TransactionHash),
            _ => {
                let spec = queryable_field(entity_type, name)?;
                Ok(OrderKey::Field {
                    name: spec.name.to_string(),
                    numeric: spec.kind.is_numeric(),
                })
            }
        }
    }
}

/// 필드 동등 조건 (텍스트 표현 기준)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub equals: String,
}

impl FieldFilter {
    pub fn parse(entity_type: &str, field: &str, equals: &str) -> Result<Self, String> {
        let spec = queryable_field(entity_type, field)?;
        // 주소/바이트는 소문자 hex로 저장됨
        let equals = match spec.kind {
            ParamKind::Address | ParamKind::FixedBytes(_) => equals.to_ascii_lowercase(),
            _ => equals.to_string(),
        };
        Ok(FieldFilter {
            field: spec.name.to_string(),
            equals,
        })
    }
}

fn queryable_field(
    entity_type: &str,
    name: &str,
) -> Result<&'static schema::ParamSpec, String> {
    let spec = schema::entity_field(entity_type, name)
        .ok_or_else(|| format!("{} has no field {}", entity_type, name))?;
    if matches!(spec.kind, ParamKind::Array(_)) {
        return Err(format!("array field {} cannot be used in a query", name));
    }
    Ok(spec)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    pub entity_type: String,
    pub first: u32,
    pub skip: u32,
    pub order_by: OrderKey,
    pub direction: OrderDirection,
    pub id_prefix: Option<String>,
    pub filter: Option<FieldFilter>,
}

impl EntityQuery {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            first: DEFAULT_PAGE_SIZE,
            skip: 0,
            order_by: OrderKey::Chain,
            direction: OrderDirection::Asc,
            id_prefix: None,
            filter: None,
        }
    }

    pub fn order_by(mut self, key: OrderKey, direction: OrderDirection) -> Self {
        self.order_by = key;
        self.direction = direction;
        self
    }

    pub fn first(mut self, first: u32) -> Self {
        self.first = first.min(MAX_PAGE_SIZE);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    pub fn id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_key_parse() {
        assert_eq!(OrderKey::parse("BidPlaced", "id"), Ok(OrderKey::Id));
        assert_eq!(
            OrderKey::parse("BidPlaced", "amount"),
            Ok(OrderKey::Field {
                name: "amount".to_string(),
                numeric: true
            })
        );
        assert_eq!(
            OrderKey::parse("BidPlaced", "bidder"),
            Ok(OrderKey::Field {
                name: "bidder".to_string(),
                numeric: false
            })
        );
        assert!(OrderKey::parse("BidPlaced", "brandName").is_err());
        assert!(OrderKey::parse("ProofSynced", "chains").is_err());
    }

    #[test]
    fn test_filter_lowercases_addresses() {
        let filter = FieldFilter::parse(
            "BidPlaced",
            "bidder",
            "0x90CBA2BBB19ECC291A12066FD8329D65FA1F1947",
        )
        .unwrap();
        assert_eq!(filter.equals, "0x90cba2bbb19ecc291a12066fd8329d65fa1f1947");

        let filter = FieldFilter::parse("BrandActivated", "brand", "Kia").unwrap();
        assert_eq!(filter.equals, "Kia");
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(OrderDirection::parse("DESC"), Ok(OrderDirection::Desc));
        assert!(OrderDirection::parse("sideways").is_err());
    }

    #[test]
    fn test_page_size_capped() {
        assert_eq!(EntityQuery::new("BidPlaced").first(5000).first, MAX_PAGE_SIZE);
    }
}
