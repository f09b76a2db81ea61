//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//!
//! ```text
//! GET  /health                         - 서버/저장소/인덱서 상태
//! GET  /entities/:entity_type          - 엔티티 목록 (정렬, 필터, 페이지네이션)
//! GET  /entities/:entity_type/:id      - 엔티티 단건 조회
//! ANY  /api/*path                      - REST 백엔드 프록시
//! ```

pub mod entities;
pub mod health;
pub mod proxy;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{any, get},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// 라우터 생성
pub fn create_router(state: AppState) -> Router {
    // CORS 설정
    // 프로덕션: ALLOWED_ORIGINS만 허용, 개발: localhost 허용
    let cors = if state.config.is_production() {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:3000"), // Next.js dev server
                HeaderValue::from_static("http://127.0.0.1:3000"),
                HeaderValue::from_static("http://localhost:5173"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        // Health check
        .route("/health", get(health::health_check))

        // Entity queries
        .route("/entities/:entity_type", get(entities::list_entities))
        .route("/entities/:entity_type/:id", get(entities::get_entity))

        // Backend proxy
        .route("/api/*path", any(proxy::forward))

        // 미들웨어
        .layer(TraceLayer::new_for_http())
        .layer(cors)

        // 상태 주입
        .with_state(state)
}
