//! The `ChainClient` capability and its retrying JSON-RPC implementation.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::B256;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use chainwatch_core::{LogEntry, LogFilter, Network, Transaction};

use crate::error::TransportError;
use crate::request::JsonRpcRequest;
use crate::retry::RetryPolicy;
use crate::transport::RpcTransport;
use crate::wire::{self, RawLog, RawTransaction};

/// The read-only chain operations the exporter needs.
///
/// All methods are idempotent. Implementations are shared between
/// deployments on the same network, so they must be safe for concurrent use.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current block height (`eth_blockNumber`).
    async fn current_height(&self) -> Result<u64, TransportError>;

    /// Logs matching `filter` (`eth_getLogs`). Logs flagged `removed` are dropped.
    async fn filter_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, TransportError>;

    /// A transaction by hash (`eth_getTransactionByHash`).
    async fn transaction_by_hash(&self, hash: B256) -> Result<Transaction, TransportError>;

    /// The endpoint's chain id (`eth_chainId`).
    async fn chain_id(&self) -> Result<u64, TransportError>;
}

/// [`ChainClient`] over any [`RpcTransport`], with every call wrapped in a
/// [`RetryPolicy`].
pub struct EvmChainClient<T> {
    network: Network,
    transport: T,
    retry: RetryPolicy,
    next_id: AtomicU64,
}

impl<T: RpcTransport> EvmChainClient<T> {
    pub fn new(network: Network, transport: T, retry: RetryPolicy) -> Self {
        Self {
            network,
            transport,
            retry,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Send one request (no retry) and deserialize the result.
    async fn call_once<R: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<R, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            method,
            network = %self.network,
            url = %self.transport.url(),
            id,
            "rpc call"
        );
        let resp = self.transport.send(JsonRpcRequest::new(id, method, params)).await?;
        let result = resp.into_result().map_err(TransportError::Rpc)?;
        Ok(serde_json::from_value(result)?)
    }

    /// Send with retry.
    async fn call<R: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<R, TransportError> {
        self.retry
            .run(method, self.network.name(), || self.call_once(method, params.clone()))
            .await
    }

    async fn call_quantity(&self, method: &str) -> Result<u64, TransportError> {
        let raw: String = self.call(method, vec![]).await?;
        wire::parse_hex_u64(&raw).map_err(|reason| TransportError::InvalidResponse {
            method: method.to_string(),
            reason,
        })
    }
}

#[async_trait]
impl<T: RpcTransport> ChainClient for EvmChainClient<T> {
    async fn current_height(&self) -> Result<u64, TransportError> {
        self.call_quantity("eth_blockNumber").await
    }

    async fn filter_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, TransportError> {
        let method = "eth_getLogs";
        let raw: Vec<RawLog> = self.call(method, vec![wire::log_filter_params(filter)]).await?;
        raw.into_iter()
            .filter(|log| !log.removed)
            .map(|log| {
                LogEntry::try_from(log).map_err(|reason| TransportError::InvalidResponse {
                    method: method.to_string(),
                    reason,
                })
            })
            .collect()
    }

    async fn transaction_by_hash(&self, hash: B256) -> Result<Transaction, TransportError> {
        let method = "eth_getTransactionByHash";
        let raw: Option<RawTransaction> = self.call(method, vec![json!(format!("{hash:#x}"))]).await?;
        let raw = raw.ok_or(TransportError::TransactionNotFound(hash))?;
        Transaction::try_from(raw).map_err(|reason| TransportError::InvalidResponse {
            method: method.to_string(),
            reason,
        })
    }

    async fn chain_id(&self) -> Result<u64, TransportError> {
        self.call_quantity("eth_chainId").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::JsonRpcResponse;
    use crate::retry::RetryConfig;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays scripted responses and records every request it sees.
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<Value, TransportError>>>,
        seen: Mutex<Vec<JsonRpcRequest>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<Value, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl RpcTransport for ScriptedTransport {
        async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
            self.seen.lock().unwrap().push(req);
            let next = self.replies.lock().unwrap().pop_front().expect("script exhausted");
            next.map(|v| JsonRpcResponse::ok(1, v))
        }

        fn url(&self) -> &str {
            "scripted"
        }
    }

    fn client(replies: Vec<Result<Value, TransportError>>) -> EvmChainClient<ScriptedTransport> {
        EvmChainClient::new(
            Network::Holesky,
            ScriptedTransport::new(replies),
            RetryPolicy::new(RetryConfig {
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(2),
                multiplier: 2.0,
                max_elapsed: Duration::from_secs(5),
            }),
        )
    }

    #[tokio::test]
    async fn height_retries_transient_errors() {
        let c = client(vec![
            Err(TransportError::Http("502 bad gateway".into())),
            Ok(json!("0x10")),
        ]);
        assert_eq!(c.current_height().await.unwrap(), 16);
        assert_eq!(c.transport.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn filter_logs_sends_range_and_skips_removed() {
        let log = |removed: bool| {
            json!({
                "address": "0x066cf95c1bf0927124dfb8b02b401bc23a79730d",
                "topics": [format!("0x{}", "11".repeat(32))],
                "data": "0x",
                "blockNumber": "0x64",
                "transactionHash": format!("0x{}", "22".repeat(32)),
                "transactionIndex": "0x0",
                "logIndex": "0x0",
                "removed": removed
            })
        };
        let c = client(vec![Ok(json!([log(false), log(true)]))]);
        let filter = LogFilter {
            from_block: 100,
            to_block: 200,
            addresses: vec![],
            topic0: vec![],
        };
        let logs = c.filter_logs(&filter).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].block_number, 100);

        let seen = c.transport.seen.lock().unwrap();
        assert_eq!(seen[0].method, "eth_getLogs");
        assert_eq!(seen[0].params[0]["fromBlock"], "0x64");
        assert_eq!(seen[0].params[0]["toBlock"], "0xc8");
    }

    #[tokio::test]
    async fn null_transaction_is_not_found() {
        let c = client(vec![Ok(Value::Null)]);
        let err = c.transaction_by_hash(B256::repeat_byte(7)).await.unwrap_err();
        assert!(matches!(err, TransportError::TransactionNotFound(h) if h == B256::repeat_byte(7)));
    }

    #[tokio::test]
    async fn transaction_input_decoded() {
        let c = client(vec![Ok(json!({
            "hash": format!("0x{}", "33".repeat(32)),
            "input": "0x7794965a00",
            "blockNumber": "0x2a"
        }))]);
        let tx = c.transaction_by_hash(B256::repeat_byte(0x33)).await.unwrap();
        assert_eq!(tx.selector(), Some([0x77, 0x94, 0x96, 0x5a]));
        assert_eq!(tx.block_number, Some(42));
    }

    #[tokio::test]
    async fn malformed_quantity_is_invalid_response() {
        let c = client(vec![Ok(json!("not-hex"))]);
        assert!(matches!(
            c.chain_id().await,
            Err(TransportError::InvalidResponse { .. })
        ));
    }
}
