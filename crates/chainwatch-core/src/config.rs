//! Exporter configuration, loaded from a YAML file.
//!
//! ```yaml
//! operators:
//!   - name: nethermind
//!     address: "0x57b6FdEF3A23B81547df68F44e5524b987755c99"
//!     blsPublicKey: ["8888...7533", "1162...0953"]
//!     avsEnvs: ["eigenda-holesky"]
//!     eigenDAConfig:
//!       quorums: { 0: true, 1: false }
//! rpcs:
//!   holesky: https://ethereum-holesky-rpc.publicnode.com
//! logLevel: debug
//! ```
//!
//! Deserialization only checks the shape; [`Config::validate`] turns the raw
//! strings into domain types and reports the first fatal problem.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::network::{Network, ProtocolEnv};
use crate::operator::{BlsPublicKey, Operator, QuorumId};

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Operators to track.
    #[serde(default)]
    pub operators: Vec<OperatorConfig>,
    /// JSON-RPC endpoint per network name.
    #[serde(default)]
    pub rpcs: HashMap<String, String>,
    /// `debug` | `info` | `warn` | `error`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable text.
    #[serde(default)]
    pub log_json: bool,
    /// Listen address of the `/metrics` endpoint.
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
    /// Seconds between two polling ticks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Per-deployment overrides, keyed by protocol environment tag.
    #[serde(default)]
    pub deployments: HashMap<String, DeploymentOverrides>,
}

/// One tracked operator as written in the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    pub name: String,
    pub address: String,
    /// BLS G1 public key as two base-10 integers.
    pub bls_public_key: [String; 2],
    #[serde(default)]
    pub avs_envs: Vec<String>,
    #[serde(rename = "eigenDAConfig", default)]
    pub eigen_da_config: EigenDaConfig,
}

/// EigenDA-specific operator settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EigenDaConfig {
    /// Quorum membership at startup. Later on-chain events take over.
    #[serde(default)]
    pub quorums: BTreeMap<QuorumId, bool>,
}

/// Retry budget of the chain client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Total time a single call may spend retrying.
    #[serde(default = "default_max_elapsed_secs")]
    pub max_elapsed_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_elapsed_secs: default_max_elapsed_secs(),
        }
    }
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn max_elapsed(&self) -> Duration {
        Duration::from_secs(self.max_elapsed_secs)
    }
}

/// Optional settings for a single deployment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOverrides {
    /// Start from this block instead of the chain head.
    pub start_block: Option<u64>,
    pub service_manager: Option<String>,
    pub bls_apk_registry: Option<String>,
}

/// Contract address overrides after validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractOverrides {
    pub service_manager: Option<Address>,
    pub bls_apk_registry: Option<Address>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_max_elapsed_secs() -> u64 {
    60
}

impl Config {
    /// Read and parse a config file. Does not validate.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Check everything that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level()?;
        self.operators()?;
        for env in self.protocol_envs()? {
            self.rpc_url(env.network())?;
            self.contract_overrides(env)?;
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroDuration { field: "pollIntervalSecs" });
        }
        let durations = [
            ("retry.initialBackoffMs", self.retry.initial_backoff_ms),
            ("retry.maxBackoffMs", self.retry.max_backoff_ms),
            ("retry.maxElapsedSecs", self.retry.max_elapsed_secs),
        ];
        if let Some((field, _)) = durations.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroDuration { field });
        }
        Ok(())
    }

    /// The deployments to run: every distinct tag referenced by an operator.
    pub fn protocol_envs(&self) -> Result<BTreeSet<ProtocolEnv>, ConfigError> {
        self.operators
            .iter()
            .flat_map(|op| op.avs_envs.iter())
            .map(|tag| ProtocolEnv::from_str(tag))
            .collect()
    }

    /// All operators converted to domain types.
    pub fn operators(&self) -> Result<Vec<Operator>, ConfigError> {
        self.operators.iter().map(OperatorConfig::to_operator).collect()
    }

    pub fn rpc_url(&self, network: Network) -> Result<&str, ConfigError> {
        self.rpcs
            .get(network.name())
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingRpcUrl {
                network: network.name().to_string(),
            })
    }

    /// `debug`, `info`, `warn` or `error`, in any case.
    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(tracing::Level::DEBUG),
            "info" => Ok(tracing::Level::INFO),
            "warn" => Ok(tracing::Level::WARN),
            "error" => Ok(tracing::Level::ERROR),
            _ => Err(ConfigError::InvalidLogLevel(self.log_level.clone())),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn start_block(&self, env: ProtocolEnv) -> Option<u64> {
        self.deployments.get(env.tag()).and_then(|d| d.start_block)
    }

    pub fn contract_overrides(&self, env: ProtocolEnv) -> Result<ContractOverrides, ConfigError> {
        let Some(overrides) = self.deployments.get(env.tag()) else {
            return Ok(ContractOverrides::default());
        };
        let parse = |raw: &Option<String>| -> Result<Option<Address>, ConfigError> {
            raw.as_deref()
                .map(|s| {
                    Address::from_str(s.trim()).map_err(|e| ConfigError::InvalidContractAddress {
                        env: env.tag().to_string(),
                        reason: format!("'{s}': {e}"),
                    })
                })
                .transpose()
        };
        Ok(ContractOverrides {
            service_manager: parse(&overrides.service_manager)?,
            bls_apk_registry: parse(&overrides.bls_apk_registry)?,
        })
    }
}

impl OperatorConfig {
    pub fn to_operator(&self) -> Result<Operator, ConfigError> {
        let address = Address::from_str(self.address.trim()).map_err(|e| ConfigError::InvalidAddress {
            operator: self.name.clone(),
            reason: e.to_string(),
        })?;
        let [x, y] = &self.bls_public_key;
        let bls_public_key = BlsPublicKey::from_decimal(x, y).map_err(|source| ConfigError::InvalidBlsKey {
            operator: self.name.clone(),
            source,
        })?;
        let envs = self
            .avs_envs
            .iter()
            .map(|tag| ProtocolEnv::from_str(tag))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Operator {
            name: self.name.clone(),
            address,
            bls_public_key,
            envs,
            bootstrap_quorums: self.eigen_da_config.quorums.clone(),
        })
    }
}
