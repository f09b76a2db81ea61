//! Database Module
//!
//! PostgreSQL implementation of `EntityStore`.
//!
//! ```text
//! entities
//! ┌─────────────┬──────────────────────────┬──────────────┬───────────┬───────────────────────┐
//! │ entity_type │ id                       │ block_number │ log_index │ fields (JSONB)        │
//! ├─────────────┼──────────────────────────┼──────────────┼───────────┼───────────────────────┤
//! │ BidPlaced   │ 0xa160...2a-1            │ 1            │ 0         │ {"amount": {...}, ..} │
//! └─────────────┴──────────────────────────┴──────────────┴───────────┴───────────────────────┘
//!   PRIMARY KEY (entity_type, id)
//!
//! indexer_checkpoint: 단일 행, 마지막으로 커밋된 블록
//! ```
//!
//! 블록 단위로 하나의 트랜잭션: 엔티티 INSERT + 체크포인트 갱신.

mod models;

pub use models::*;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};

use crate::error::StoreError;
use crate::indexing::Entity;
use crate::store::{BatchOutcome, EntityQuery, EntityStore, OrderDirection, OrderKey};

const ENTITY_COLUMNS: &str = "entity_type, id, block_number, block_timestamp, \
                              transaction_hash, log_index, fields, indexed_at";

/// 데이터베이스 연결 및 쿼리 담당
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 데이터베이스 연결
    ///
    /// # Connection Pool Settings
    ///
    /// - max_connections: 10
    /// - min_connections: 1
    /// - acquire_timeout: 3초
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// 마이그레이션 실행
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_entity(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        entity: &Entity,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO entities (
                entity_type, id, block_number, block_timestamp,
                transaction_hash, log_index, fields, indexed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (entity_type, id) DO NOTHING
            "#
        )
        .bind(&entity.entity_type)
        .bind(&entity.id)
        .bind(entity.block_number as i64)
        .bind(entity.block_timestamp as i64)
        .bind(entity.transaction_hash_hex())
        .bind(entity.log_index as i64)
        .bind(fields_document(entity)?)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// WHERE 절 (entity_type, id prefix, field equality)
fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, query: &EntityQuery) {
    builder
        .push(" WHERE entity_type = ")
        .push_bind(query.entity_type.clone());

    if let Some(prefix) = &query.id_prefix {
        builder
            .push(" AND id LIKE ")
            .push_bind(format!("{}%", escape_like(prefix)));
    }

    if let Some(filter) = &query.filter {
        builder
            .push(" AND fields -> ")
            .push_bind(filter.field.clone())
            .push(" ->> 'value' = ")
            .push_bind(filter.equals.clone());
    }
}

fn push_order(builder: &mut QueryBuilder<'_, Postgres>, key: &OrderKey, direction: OrderDirection) {
    let dir = match direction {
        OrderDirection::Asc => "ASC NULLS FIRST",
        OrderDirection::Desc => "DESC NULLS LAST",
    };

    builder.push(" ORDER BY ");
    match key {
        OrderKey::Chain => {
            builder.push(format_args!("block_number {dir}, log_index {dir}"));
        }
        OrderKey::Id => {
            builder.push(format_args!(r#"id COLLATE "C" {dir}"#));
        }
        OrderKey::BlockNumber => {
            builder.push(format_args!("block_number {dir}"));
        }
        OrderKey::BlockTimestamp => {
            builder.push(format_args!("block_timestamp {dir}"));
        }
        OrderKey::TransactionHash => {
            builder.push(format_args!(r#"transaction_hash COLLATE "C" {dir}"#));
        }
        OrderKey::Field { name, numeric } => {
            builder.push("(fields -> ").push_bind(name.clone());
            if *numeric {
                builder.push(format_args!(" ->> 'value')::numeric {dir}"));
            } else {
                builder.push(format_args!(r#" ->> 'value') COLLATE "C" {dir}"#));
            }
        }
    }
    // 동률은 항상 체인 순서
    builder.push(", block_number ASC, log_index ASC, id ASC");
}

/// LIKE 메타문자 이스케이프 (기본 escape 문자 `\`)
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl EntityStore for Database {
    async fn save_batch(
        &self,
        entities: &[Entity],
        checkpoint: Option<u64>,
    ) -> Result<BatchOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut outcome = BatchOutcome::default();

        for entity in entities {
            if Self::insert_entity(&mut tx, entity).await? {
                outcome.inserted += 1;
                continue;
            }

            // 이미 존재: 내용이 같으면 재처리, 다르면 충돌 (tx drop → rollback)
            let existing = sqlx::query_as::<_, EntityRow>(&format!(
                "SELECT {} FROM entities WHERE entity_type = $1 AND id = $2",
                ENTITY_COLUMNS
            ))
            .bind(&entity.entity_type)
            .bind(&entity.id)
            .fetch_one(&mut *tx)
            .await?;

            if Entity::try_from(existing)? == *entity {
                outcome.unchanged += 1;
            } else {
                return Err(StoreError::DuplicateId {
                    entity_type: entity.entity_type.clone(),
                    id: entity.id.clone(),
                });
            }
        }

        if let Some(block) = checkpoint {
            sqlx::query(
                r#"
                INSERT INTO indexer_checkpoint (id, block_number, updated_at)
                VALUES (1, $1, NOW())
                ON CONFLICT (id)
                DO UPDATE SET
                    block_number = GREATEST(indexer_checkpoint.block_number, EXCLUDED.block_number),
                    updated_at = NOW()
                "#
            )
            .bind(block as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(outcome)
    }

    async fn get(&self, entity_type: &str, id: &str) -> Result<Option<Entity>, StoreError> {
        let row = sqlx::query_as::<_, EntityRow>(&format!(
            "SELECT {} FROM entities WHERE entity_type = $1 AND id = $2",
            ENTITY_COLUMNS
        ))
        .bind(entity_type)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Entity::try_from).transpose()
    }

    async fn query(&self, query: &EntityQuery) -> Result<Vec<Entity>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM entities", ENTITY_COLUMNS));
        push_conditions(&mut builder, query);
        push_order(&mut builder, &query.order_by, query.direction);
        builder
            .push(" LIMIT ")
            .push_bind(i64::from(query.first))
            .push(" OFFSET ")
            .push_bind(i64::from(query.skip));

        let rows = builder
            .build_query_as::<EntityRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Entity::try_from).collect()
    }

    async fn count(&self, query: &EntityQuery) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM entities");
        push_conditions(&mut builder, query);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn checkpoint(&self) -> Result<Option<u64>, StoreError> {
        let block: Option<i64> =
            sqlx::query_scalar("SELECT block_number FROM indexer_checkpoint WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(block.map(|b| b.max(0) as u64))
    }

    /// Health check
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FieldFilter;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("0xab"), "0xab");
        assert_eq!(escape_like("a_b%c\\"), "a\\_b\\%c\\\\");
    }

    #[test]
    fn test_query_sql() {
        let query = EntityQuery::new("BidPlaced")
            .id_prefix("0xa1")
            .filter(FieldFilter::parse("BidPlaced", "auctionId", "1").unwrap())
            .order_by(OrderKey::parse("BidPlaced", "amount").unwrap(), OrderDirection::Desc);

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM entities");
        push_conditions(&mut builder, &query);
        push_order(&mut builder, &query.order_by, query.direction);

        assert_eq!(
            builder.sql(),
            "SELECT * FROM entities WHERE entity_type = $1 AND id LIKE $2 \
             AND fields -> $3 ->> 'value' = $4 \
             ORDER BY (fields -> $5 ->> 'value')::numeric DESC NULLS LAST, \
             block_number ASC, log_index ASC, id ASC"
        );
    }

    #[test]
    fn test_chain_order_sql() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT *");
        push_order(&mut builder, &OrderKey::Chain, OrderDirection::Asc);
        assert!(builder
            .sql()
            .starts_with("SELECT * ORDER BY block_number ASC NULLS FIRST, log_index ASC NULLS FIRST"));
    }

    // ============ PostgreSQL 통합 테스트 ============
    // DATABASE_URL이 필요하다: cargo test -- --ignored

    use crate::indexing::fixtures::*;
    use crate::indexing::handle_event;
    use crate::store::SaveOutcome;

    const ALICE: &str = "0x90cba2bbb19ecc291a12066fd8329d65fa1f1947";
    const BOB: &str = "0x89205a3a3b2a69de6dbf7f01ed13b2108b2c43e7";

    fn bid(bidder: &str, amount: u64, log_index: u64) -> Entity {
        handle_event(&bid_placed(1, bidder, amount, log_index)).unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_postgres_resave_is_idempotent(pool: PgPool) {
        let db = Database { pool };
        let entity = bid(ALICE, 100, 0);

        assert_eq!(db.save(&entity).await.unwrap(), SaveOutcome::Inserted);
        assert_eq!(db.save(&entity).await.unwrap(), SaveOutcome::AlreadyStored);

        let loaded = db.get("BidPlaced", &entity.id).await.unwrap().unwrap();
        assert_eq!(loaded, entity);
        assert_eq!(db.count(&EntityQuery::new("BidPlaced")).await.unwrap(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_postgres_duplicate_rolls_back_batch(pool: PgPool) {
        let db = Database { pool };
        db.save_batch(&[bid(ALICE, 100, 0)], Some(1)).await.unwrap();

        // 새 엔티티 + 내용이 다른 기존 ID: 전체가 롤백되어야 한다
        let batch = vec![bid(BOB, 200, 1), bid(ALICE, 999, 0)];
        let err = db.save_batch(&batch, Some(2)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));

        assert_eq!(db.count(&EntityQuery::new("BidPlaced")).await.unwrap(), 1);
        assert!(db.get("BidPlaced", &batch[0].id).await.unwrap().is_none());
        assert_eq!(db.checkpoint().await.unwrap(), Some(1));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_postgres_checkpoint_only_moves_forward(pool: PgPool) {
        let db = Database { pool };
        assert_eq!(db.checkpoint().await.unwrap(), None);

        db.save_batch(&[], Some(10)).await.unwrap();
        db.save_batch(&[], Some(7)).await.unwrap();
        assert_eq!(db.checkpoint().await.unwrap(), Some(10));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_postgres_numeric_order_and_filter(pool: PgPool) {
        let db = Database { pool };
        let batch = vec![bid(ALICE, 9, 0), bid(BOB, 10, 1), bid(ALICE, 100, 2)];
        db.save_batch(&batch, Some(1)).await.unwrap();

        let query = EntityQuery::new("BidPlaced")
            .filter(FieldFilter::parse("BidPlaced", "bidder", ALICE).unwrap())
            .order_by(OrderKey::parse("BidPlaced", "amount").unwrap(), OrderDirection::Asc);
        let amounts: Vec<String> = db
            .query(&query)
            .await
            .unwrap()
            .iter()
            .filter_map(|e| e.field_text("amount"))
            .collect();
        assert_eq!(amounts, ["9", "100"]);
        assert_eq!(db.count(&query).await.unwrap(), 2);
    }
}
