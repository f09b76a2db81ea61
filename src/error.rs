//! Error Handling Module
//!
//! Domain errors for the indexing pipeline (decode, store, index) plus the
//! HTTP-facing `ApiError` with status code mapping.
//! Uses thiserror for domain errors and integrates with tracing for structured logging.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// 이벤트 디코딩 에러
///
/// 스키마와 맞지 않는 이벤트는 기본값으로 채우지 않고 여기서 실패한다.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no mapping for event {event} on {contract}")]
    UnknownEvent { contract: String, event: String },

    #[error("{event}: expected {expected} params, got {actual}")]
    ParamCount {
        event: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{event}: param #{position} should be `{expected}`, got `{actual}`")]
    ParamName {
        event: &'static str,
        position: usize,
        expected: &'static str,
        actual: String,
    },

    #[error("{event}.{param}: expected {expected}, got {actual}")]
    ParamType {
        event: &'static str,
        param: &'static str,
        expected: String,
        actual: String,
    },

    #[error("log index {0} does not fit in 32 bits")]
    LogIndexOverflow(u64),

    #[error("ABI decode failed for {event}: {reason}")]
    Abi { event: &'static str, reason: String },
}

/// 엔티티 저장소 에러
#[derive(Debug, Error)]
pub enum StoreError {
    /// 같은 ID, 다른 내용 → 호스트 레벨 순서/재처리 버그
    #[error("duplicate entity id {entity_type}/{id} with different content")]
    DuplicateId { entity_type: String, id: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt entity row: {0}")]
    Corrupt(String),
}

/// 인덱싱 파이프라인 에러
///
/// 어떤 variant든 현재 배치를 중단시킨다 (체크포인트 전진 없음).
#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(
        "event out of order: ({block}, {log_index}) after ({prev_block}, {prev_log_index})"
    )]
    OutOfOrder {
        block: u64,
        log_index: u64,
        prev_block: u64,
        prev_log_index: u64,
    },

    #[error("event from block {actual} in batch for block {expected}")]
    BlockMismatch { expected: u64, actual: u64 },

    #[error("chain source error: {0}")]
    Source(String),
}

/// 백엔드 프록시 에러
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("unsupported method {0}")]
    InvalidMethod(String),

    #[error("backend request failed: {0}")]
    Unreachable(#[from] reqwest::Error),
}

/// API 에러 타입
///
/// 각 에러 variant는 적절한 HTTP 상태 코드에 매핑됨
/// 민감한 내부 정보는 클라이언트에 노출하지 않음
#[derive(Debug, Error)]
pub enum ApiError {
    // ============ 400 Bad Request ============
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ============ 404 Not Found ============
    #[error("Resource not found: {0}")]
    NotFound(String),

    // ============ 500 Internal Server Error ============
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    InternalError,

    // ============ 503 Service Unavailable ============
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// API 에러 응답 구조
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            // 4xx 클라이언트 에러
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg.clone(),
                None,
            ),
            ApiError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                Some(msg.clone()),
            ),
            ApiError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{} not found", resource),
                None,
            ),

            // 5xx 서버 에러
            ApiError::DatabaseError(_) => {
                // 내부 에러는 클라이언트에 상세 정보 노출 안 함
                tracing::error!("Database error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error occurred".to_string(),
                    None,
                )
            }
            ApiError::InternalError => {
                tracing::error!("Internal error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(service) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                format!("{} is currently unavailable", service),
                None,
            ),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// 저장소 에러를 ApiError로 변환
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Store error: {:?}", err);
        ApiError::DatabaseError(err.to_string())
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::InvalidMethod(method) => {
                ApiError::BadRequest(format!("unsupported method {}", method))
            }
            ProxyError::Unreachable(err) => {
                tracing::warn!("Backend proxy error: {:?}", err);
                ApiError::ServiceUnavailable("Backend API".to_string())
            }
        }
    }
}
