//! Backend Proxy
//!
//! Forwards `/api/*` requests to the off-chain REST backend (cars, bids,
//! auth, NFT/role requests). No state is kept here: the backend owns all
//! records, and an unreachable backend is reported as such instead of being
//! answered from local memory.

use std::time::Duration;

use anyhow::Result;

use crate::error::ProxyError;

/// 전달할 요청
#[derive(Debug, Clone, Default)]
pub struct ProxyRequest {
    pub method: String,
    /// `/api` 이후 경로 (`cars/12`)
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: Vec<u8>,
}

/// 백엔드 응답 (상태 코드/본문 그대로)
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

pub struct BackendProxy {
    client: reqwest::Client,
    base_url: String,
}

impl BackendProxy {
    /// 요청 타임아웃 10초
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}/api/{}", self.base_url, path.trim_start_matches('/'));
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    pub async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| ProxyError::InvalidMethod(request.method.clone()))?;
        let url = self.target_url(&request.path, request.query.as_deref());

        tracing::debug!("Proxying {} {}", method, url);

        let mut builder = self.client.request(method, &url);
        if let Some(content_type) = &request.content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        if let Some(authorization) = &request.authorization {
            builder = builder.header(reqwest::header::AUTHORIZATION, authorization);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.bytes().await?.to_vec();

        Ok(ProxyResponse {
            status,
            content_type,
            body,
        })
    }
}
