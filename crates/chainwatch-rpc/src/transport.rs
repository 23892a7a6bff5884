//! The `RpcTransport` trait and its HTTP implementation backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// Sends one JSON-RPC request. No retry, no caching.
///
/// Object-safe; implementations must be `Send + Sync` for use across Tokio tasks.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// The endpoint identifier (URL or name), used in logs.
    fn url(&self) -> &str;
}

/// Plain HTTP JSON-RPC transport.
pub struct HttpTransport {
    url: String,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            http,
            request_timeout,
        })
    }

    fn map_reqwest(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited { url: self.url.clone() });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {}: {body}", status.as_u16())));
        }

        resp.json::<JsonRpcResponse>()
            .await
            .map_err(|e| self.map_reqwest(e))
    }

    fn url(&self) -> &str {
        &self.url
    }
}
