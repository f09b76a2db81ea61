//! Health Check Endpoint
//!
//! Deep health check: store connectivity and how far indexing has got.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health check 응답
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: StoreStatus,
    pub indexer: IndexerStatus,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct StoreStatus {
    pub backend: String,
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

#[derive(Serialize)]
pub struct IndexerStatus {
    pub enabled: bool,
    /// 인덱서 태스크가 살아 있는지
    pub running: bool,
    /// 마지막으로 커밋된 블록
    pub checkpoint: Option<u64>,
}

/// GET /health
///
/// 서버 및 의존성 상태 확인
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // 저장소 연결 테스트
    let start = std::time::Instant::now();
    let store_status = match state.store.health_check().await {
        Ok(_) => StoreStatus {
            backend: state.store.backend().to_string(),
            connected: true,
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            StoreStatus {
                backend: state.store.backend().to_string(),
                connected: false,
                latency_ms: None,
            }
        }
    };

    let checkpoint = if store_status.connected {
        state.store.checkpoint().await.ok().flatten()
    } else {
        None
    };

    // 인덱서를 띄웠는데 태스크가 죽었으면 degraded
    let enabled = state.indexer.is_some();
    let running = state.indexer.as_ref().is_some_and(|l| l.is_running());
    if enabled && !running {
        tracing::warn!("Indexer task is not running");
    }
    let healthy = store_status.connected && (running || !enabled);

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store_status,
        indexer: IndexerStatus {
            enabled,
            running,
            checkpoint,
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
