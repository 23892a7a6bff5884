//! Transport and client error types.

use alloy_primitives::B256;
use chainwatch_core::ConfigError;
use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors that can occur during a chain RPC operation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, 5xx, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// The endpoint answered 429.
    #[error("Rate limit exceeded (endpoint: {url})")]
    RateLimited { url: String },

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The response was well-formed JSON-RPC but not the expected shape.
    #[error("Invalid response for {method}: {reason}")]
    InvalidResponse { method: String, reason: String },

    /// `eth_getTransactionByHash` returned `null`.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(B256),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl TransportError {
    /// Returns `true` if this error is transient and the call may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }
}

/// Errors from [`crate::registry::ClientRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to {network}: {source}")]
    Connect {
        network: String,
        #[source]
        source: TransportError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(TransportError::Http("connection refused".into()).is_retryable());
        assert!(TransportError::Timeout { ms: 30_000 }.is_retryable());
        assert!(TransportError::RateLimited { url: "http://x".into() }.is_retryable());
        assert!(!TransportError::TransactionNotFound(B256::ZERO).is_retryable());
        assert!(!TransportError::Rpc(JsonRpcError {
            code: -32602,
            message: "invalid params".into(),
            data: None,
        })
        .is_retryable());
    }
}
