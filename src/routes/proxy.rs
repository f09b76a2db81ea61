//! Backend Proxy Endpoint
//!
//! `ANY /api/*path` → `BACKEND_API_URL/api/*path`

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::services::ProxyRequest;
use crate::AppState;

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// ANY /api/*path
///
/// 메서드, 쿼리 문자열, 본문, `Authorization`/`Content-Type`을 그대로 전달하고
/// 백엔드의 상태 코드와 본문을 그대로 돌려준다.
pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = ProxyRequest {
        method: method.as_str().to_string(),
        path,
        query,
        content_type: header_string(&headers, header::CONTENT_TYPE),
        authorization: header_string(&headers, header::AUTHORIZATION),
        body: body.to_vec(),
    };

    let upstream = state.proxy.forward(request).await?;
    let status = StatusCode::from_u16(upstream.status).map_err(|_| {
        tracing::error!("Backend returned invalid status {}", upstream.status);
        ApiError::InternalError
    })?;

    let mut response = (status, upstream.body).into_response();
    if let Some(value) = upstream
        .content_type
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    Ok(response)
}
