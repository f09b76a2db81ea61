//! Zero Marketplace Indexer Server
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Smart Contracts (EVM)                     │
//! │  Auction  CarRegistry  MerkleVerifier  Profile  ProofSync   │
//! │  ZeroNFT                                                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ eth_getLogs
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Indexer Task                            │
//! │  BlockchainService → decode → map_event → save_batch        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                EntityStore (PostgreSQL | Memory)             │
//! └─────────────────────────────────────────────────────────────┘
//!                              ▲
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum Web Server                         │
//! │  /health  /entities/*  /api/* (backend proxy)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// 라이브러리에서 가져오기
use zero_indexer::{
    config::StoreBackend,
    routes,
    services::{BlockchainConfig, ChainSource},
    AppState, BackendProxy, BlockchainService, Config, Database, EntityStore, Indexer,
    MemoryStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    // RUST_LOG=debug,sqlx=warn 형태로 레벨 제어 가능
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "zero_indexer=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting Zero Marketplace Indexer");

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("📋 Configuration loaded");

    // 저장소 연결
    let store: Arc<dyn EntityStore> = match &config.store {
        StoreBackend::Postgres { database_url } => {
            let db = Database::connect(database_url).await?;
            tracing::info!("🗄️  Database connected");

            // 마이그레이션 실행
            db.run_migrations().await?;
            tracing::info!("📦 Migrations completed");
            Arc::new(db)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; entities are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // 인덱서 시작
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let indexer_enabled = config.indexer.enabled && !config.contracts.is_empty();
    let (indexer_handle, indexer_liveness) = if indexer_enabled {
        let chain: Arc<dyn ChainSource> = Arc::new(BlockchainService::new(BlockchainConfig {
            rpc_url: config.eth_rpc_url.clone(),
            contracts: config.contracts.clone(),
        })?);
        for (contract, address) in &config.contracts {
            tracing::info!("⛓️  Indexing {} at {:#x}", contract, address);
        }

        let indexer = Indexer::new(store.clone(), config.indexer.clone());
        let liveness = indexer.liveness();
        (Some(tokio::spawn(indexer.run(chain, shutdown_rx))), Some(liveness))
    } else {
        tracing::warn!("Indexer disabled (INDEXER_ENABLED=false or no contract addresses)");
        (None, None)
    };

    let proxy = BackendProxy::new(&config.backend_api_url)?;
    tracing::info!("🔁 Proxying /api/* to {}", config.backend_api_url);

    // 앱 상태 구성
    let state = AppState {
        store,
        proxy: Arc::new(proxy),
        config: Arc::new(config.clone()),
        indexer: indexer_liveness,
    };

    // 라우터 구성
    let app = routes::create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🌐 Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await?;

    // 인덱서 정지
    shutdown_tx.send(true).ok();
    if let Some(handle) = indexer_handle {
        // 패닉으로 이미 끝났다면 여기서 원인을 남긴다
        if let Err(e) = handle.await {
            tracing::error!("Indexer task failed: {}", e);
        }
    }

    Ok(())
}
