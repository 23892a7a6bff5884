//! chainwatch-rpc: EVM JSON-RPC chain client for ChainWatch.
//!
//! # Overview
//!
//! - [`ChainClient`]: the read-only chain capability the exporter consumes
//! - [`EvmChainClient`]: JSON-RPC implementation over any [`RpcTransport`]
//! - [`RetryPolicy`]: exponential backoff bounded by total elapsed time
//! - [`ClientRegistry`]: one shared client per network, chain id checked
//!
//! Transient failures (HTTP, timeouts, 429) are retried inside every call.
//! Errors the node itself returns are passed through untouched.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod registry;
pub mod request;
pub mod retry;
pub mod transport;
pub mod wire;

pub use client::{ChainClient, EvmChainClient};
pub use error::{RegistryError, TransportError};
pub use registry::{ClientFactory, ClientRegistry, HttpClientFactory};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use retry::{RetryConfig, RetryPolicy};
pub use transport::{HttpTransport, RpcTransport};
