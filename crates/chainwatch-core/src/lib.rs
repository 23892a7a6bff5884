//! chainwatch-core: domain model shared by every ChainWatch crate.
//!
//! # Architecture
//!
//! ```text
//! Supervisor → DeploymentTask (one per ProtocolEnv)
//!                  ├── ChainClient       (chainwatch-rpc, cached per Network)
//!                  ├── Deployment        (chainwatch-abi, contracts + ABIs)
//!                  ├── Roster            (operators of this deployment)
//!                  ├── Cursor            (next block to process)
//!                  └── ExporterMetrics   (prometheus registry)
//! ```

pub mod config;
pub mod cursor;
pub mod error;
pub mod network;
pub mod operator;
pub mod types;

pub use config::{Config, ContractOverrides, OperatorConfig, RetryConfig};
pub use cursor::{BlockRange, Cursor, MAX_BLOCK_RANGE};
pub use error::{ConfigError, KeyParseError};
pub use network::{Network, ProtocolEnv};
pub use operator::{BlsPublicKey, Operator, QuorumId, Roster};
pub use types::{LogEntry, LogFilter, Transaction};
