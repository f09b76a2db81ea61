//! Services Module
//!
//! 인덱싱/프록시 서비스 레이어
//!
//! # Services
//! - `BlockchainService`: RPC 로그 조회 (`ChainSource` 구현)
//! - `Indexer`: 블록 단위 동기화 루프
//! - `BackendProxy`: REST 백엔드 프록시

mod blockchain;
mod indexer;
mod proxy;

pub use blockchain::{BlockchainConfig, BlockchainService, ChainSource, LogRouter};
pub use indexer::{Indexer, IndexerLiveness, SyncProgress};
pub use proxy::{BackendProxy, ProxyRequest, ProxyResponse};
