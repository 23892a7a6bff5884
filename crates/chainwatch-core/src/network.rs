//! Networks and protocol environments (AVS deployments).

use std::str::FromStr;

use crate::error::ConfigError;

/// An EVM network the exporter can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Network {
    Holesky,
    Mainnet,
}

impl Network {
    /// Name used in config `rpcs` keys and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Holesky => "holesky",
            Self::Mainnet => "mainnet",
        }
    }

    /// EIP-155 chain id expected from `eth_chainId`.
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Holesky => 17_000,
            Self::Mainnet => 1,
        }
    }

    /// Returns an error if `actual` is not this network's chain id.
    pub fn assert_chain_id(&self, actual: u64) -> Result<(), ConfigError> {
        if actual != self.chain_id() {
            return Err(ConfigError::ChainIdMismatch {
                network: self.name().to_string(),
                expected: self.chain_id(),
                actual,
            });
        }
        Ok(())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "holesky" => Ok(Self::Holesky),
            "mainnet" => Ok(Self::Mainnet),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A protocol deployment tag as it appears in operator `avsEnvs`.
///
/// Each tag binds one protocol to exactly one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolEnv {
    EigenDaHolesky,
    EigenDaMainnet,
}

impl ProtocolEnv {
    pub const ALL: [ProtocolEnv; 2] = [Self::EigenDaHolesky, Self::EigenDaMainnet];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::EigenDaHolesky => "eigenda-holesky",
            Self::EigenDaMainnet => "eigenda-mainnet",
        }
    }

    pub fn network(&self) -> Network {
        match self {
            Self::EigenDaHolesky => Network::Holesky,
            Self::EigenDaMainnet => Network::Mainnet,
        }
    }
}

impl FromStr for ProtocolEnv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|env| env.tag() == s)
            .ok_or_else(|| ConfigError::UnknownProtocolEnv(s.to_string()))
    }
}

impl std::fmt::Display for ProtocolEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
