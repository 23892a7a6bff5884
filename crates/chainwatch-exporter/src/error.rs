//! Error types for the exporter pipeline.

use chainwatch_abi::{DecodeError, ResolveError};
use chainwatch_core::ConfigError;
use chainwatch_rpc::{RegistryError, TransportError};
use thiserror::Error;

/// Errors that can occur while running a deployment.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// A single log or transaction payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The chain client failed after exhausting its retry budget.
    #[error("chain error: {0}")]
    Chain(#[from] TransportError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("deployment resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("metrics registration failed: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("deployment task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ExporterError {
    /// Returns `true` if the error concerns one log entry only.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns `true` if the error came from the chain client.
    pub fn is_chain(&self) -> bool {
        matches!(self, Self::Chain(_))
    }
}
