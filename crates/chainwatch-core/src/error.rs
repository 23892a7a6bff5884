//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading or validating the exporter configuration.
///
/// Every variant is fatal: the exporter refuses to start polling.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid AVS environment: {0}")]
    UnknownProtocolEnv(String),

    #[error("invalid network: {0}")]
    UnknownNetwork(String),

    #[error("no RPC URL found for network: {network}")]
    MissingRpcUrl { network: String },

    #[error("invalid address for operator '{operator}': {reason}")]
    InvalidAddress { operator: String, reason: String },

    #[error("invalid BLS public key for operator '{operator}': {source}")]
    InvalidBlsKey {
        operator: String,
        #[source]
        source: KeyParseError,
    },

    #[error("invalid contract address override for {env}: {reason}")]
    InvalidContractAddress { env: String, reason: String },

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("chain id mismatch for network {network}: expected {expected}, got {actual}")]
    ChainIdMismatch {
        network: String,
        expected: u64,
        actual: u64,
    },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// A BLS key coordinate that is not a 256-bit base-10 integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{coordinate} coordinate '{value}' is not a 256-bit decimal integer")]
pub struct KeyParseError {
    pub coordinate: &'static str,
    pub value: String,
}
