//! In-memory entity store for development and tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BatchOutcome, EntityQuery, EntityStore, OrderDirection, OrderKey};
use crate::error::StoreError;
use crate::indexing::Entity;

#[derive(Default)]
struct Inner {
    /// entity_type → id → entity
    tables: HashMap<String, BTreeMap<String, Entity>>,
    checkpoint: Option<u64>,
}

/// 프로세스 메모리 저장소 (재시작 시 초기화)
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.tables.values().map(BTreeMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn matches(entity: &Entity, query: &EntityQuery) -> bool {
    if let Some(prefix) = &query.id_prefix {
        if !entity.id.starts_with(prefix.as_str()) {
            return false;
        }
    }
    if let Some(filter) = &query.filter {
        if entity.field_text(&filter.field).as_deref() != Some(filter.equals.as_str()) {
            return false;
        }
    }
    true
}

fn compare_by(key: &OrderKey, a: &Entity, b: &Entity) -> Ordering {
    match key {
        OrderKey::Chain => a.position().cmp(&b.position()),
        OrderKey::Id => a.id.cmp(&b.id),
        OrderKey::BlockNumber => a.block_number.cmp(&b.block_number),
        OrderKey::BlockTimestamp => a.block_timestamp.cmp(&b.block_timestamp),
        OrderKey::TransactionHash => a.transaction_hash.as_ref().cmp(b.transaction_hash.as_ref()),
        OrderKey::Field { name, .. } => match (a.get(name), b.get(name)) {
            (Some(x), Some(y)) => x.compare(y),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn save_batch(
        &self,
        entities: &[Entity],
        checkpoint: Option<u64>,
    ) -> Result<BatchOutcome, StoreError> {
        let mut inner = self.inner.write().await;

        // 검증 먼저: 충돌이 있으면 아무것도 쓰지 않는다
        let mut pending: HashMap<(&str, &str), &Entity> = HashMap::new();
        let mut outcome = BatchOutcome::default();
        for entity in entities {
            let key = (entity.entity_type.as_str(), entity.id.as_str());
            let existing = inner
                .tables
                .get(&entity.entity_type)
                .and_then(|table| table.get(&entity.id))
                .or_else(|| pending.get(&key).copied());

            match existing {
                Some(stored) if stored == entity => outcome.unchanged += 1,
                Some(_) => {
                    return Err(StoreError::DuplicateId {
                        entity_type: entity.entity_type.clone(),
                        id: entity.id.clone(),
                    })
                }
                None => {
                    pending.insert(key, entity);
                    outcome.inserted += 1;
                }
            }
        }

        for entity in pending.into_values() {
            inner
                .tables
                .entry(entity.entity_type.clone())
                .or_default()
                .insert(entity.id.clone(), entity.clone());
        }
        if let Some(block) = checkpoint {
            inner.checkpoint = Some(inner.checkpoint.map_or(block, |cp| cp.max(block)));
        }

        Ok(outcome)
    }

    async fn get(&self, entity_type: &str, id: &str) -> Result<Option<Entity>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tables
            .get(entity_type)
            .and_then(|table| table.get(id))
            .cloned())
    }

    async fn query(&self, query: &EntityQuery) -> Result<Vec<Entity>, StoreError> {
        let inner = self.inner.read().await;
        let Some(table) = inner.tables.get(&query.entity_type) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<&Entity> = table.values().filter(|e| matches(e, query)).collect();
        rows.sort_by(|a, b| {
            let primary = compare_by(&query.order_by, a, b);
            let primary = match query.direction {
                OrderDirection::Asc => primary,
                OrderDirection::Desc => primary.reverse(),
            };
            primary
                .then_with(|| a.position().cmp(&b.position()))
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(rows
            .into_iter()
            .skip(query.skip as usize)
            .take(query.first as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, query: &EntityQuery) -> Result<u64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tables
            .get(&query.entity_type)
            .map_or(0, |table| table.values().filter(|e| matches(e, query)).count() as u64))
    }

    async fn checkpoint(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.inner.read().await.checkpoint)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
