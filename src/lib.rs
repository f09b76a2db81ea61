//! Zero Marketplace Indexer Library
//!
//! # Overview
//!
//! 탈중앙 중고차 경매 마켓플레이스(Zero)의 온체인 이벤트 인덱서.
//! 컨트랙트 이벤트 하나가 조회 가능한 엔티티 레코드 하나가 된다.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   eth_getLogs   ┌───────────────────────────────────────────┐
//! │  RPC Node    │◀────────────────│                 Indexer                   │
//! └──────────────┘                 │  ChainSource → decode → map_event → store │
//!                                  └─────────────────────┬─────────────────────┘
//!                                                        │ save_batch
//!                                                        ▼
//! ┌──────────────┐  /entities/*    ┌───────────────────────────────────────────┐
//! │  Frontend    │────────────────▶│       EntityStore (Postgres | Memory)     │
//! │              │  /api/*         └───────────────────────────────────────────┘
//! │              │────────────────▶ BackendProxy ──▶ REST backend
//! └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - `schema`: 컨트랙트별 이벤트 레이아웃 (정적 디스크립터)
//! - `indexing`: 디코딩 + 매핑 (순수 함수)
//! - `store`: 엔티티 저장소 trait + in-memory 구현
//! - `db`: PostgreSQL 저장소
//! - `services`: 체인 소스, 동기화 루프, 백엔드 프록시
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 처리
//! - `types`: 공통 타입 정의
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zero_indexer::{indexing::handle_event, store::MemoryStore, store::EntityStore};
//!
//! let entity = handle_event(&raw_event)?;
//! store.save(&entity).await?;
//! ```

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod indexing;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use db::Database;
pub use error::ApiError;
pub use services::{BackendProxy, BlockchainService, Indexer, IndexerLiveness};
pub use store::{EntityStore, MemoryStore};

/// 애플리케이션 전역 상태
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub proxy: Arc<BackendProxy>,
    pub config: Arc<Config>,
    /// 인덱서를 띄우지 않았으면 `None`
    pub indexer: Option<Arc<IndexerLiveness>>,
}
