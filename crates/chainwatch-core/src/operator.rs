//! Operators and the per-deployment roster.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, U256};

use crate::error::KeyParseError;
use crate::network::ProtocolEnv;

/// A quorum number as emitted on-chain (one byte of `quorumNumbers`).
pub type QuorumId = u8;

/// A BLS G1 public key as an (X, Y) coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlsPublicKey {
    pub x: U256,
    pub y: U256,
}

impl BlsPublicKey {
    pub fn new(x: U256, y: U256) -> Self {
        Self { x, y }
    }

    /// Parse a key from two base-10 integer strings.
    pub fn from_decimal(x: &str, y: &str) -> Result<Self, KeyParseError> {
        let parse = |coordinate: &'static str, raw: &str| {
            U256::from_str_radix(raw.trim(), 10).map_err(|_| KeyParseError {
                coordinate,
                value: raw.to_string(),
            })
        };
        Ok(Self::new(parse("x", x)?, parse("y", y)?))
    }

    /// Full point equality: both coordinates must match.
    pub fn matches(&self, x: &U256, y: &U256) -> bool {
        self.x == *x && self.y == *y
    }
}

/// A configured participant whose on-chain behaviour is tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub name: String,
    pub address: Address,
    pub bls_public_key: BlsPublicKey,
    /// Deployments this operator takes part in.
    pub envs: BTreeSet<ProtocolEnv>,
    /// Quorum membership at startup. Only used to seed gauges.
    pub bootstrap_quorums: BTreeMap<QuorumId, bool>,
}

impl Operator {
    pub fn participates_in(&self, env: ProtocolEnv) -> bool {
        self.envs.contains(&env)
    }
}

/// The operators of one deployment.
///
/// Filtered once at construction; lookups never mutate it.
#[derive(Debug, Clone)]
pub struct Roster {
    env: ProtocolEnv,
    operators: Vec<Operator>,
}

impl Roster {
    /// Keep only the operators that declared `env`.
    pub fn for_env<'a>(env: ProtocolEnv, operators: impl IntoIterator<Item = &'a Operator>) -> Self {
        let operators = operators
            .into_iter()
            .filter(|op| op.participates_in(env))
            .cloned()
            .collect();
        Self { env, operators }
    }

    pub fn env(&self) -> ProtocolEnv {
        self.env
    }

    /// Find the operator registered under `address`.
    pub fn find_by_address(&self, address: &Address) -> Option<&Operator> {
        self.operators.iter().find(|op| op.address == *address)
    }

    /// Operators whose BLS key is exactly (`x`, `y`).
    pub fn find_by_pubkey<'a>(&'a self, x: &'a U256, y: &'a U256) -> impl Iterator<Item = &'a Operator> + 'a {
        self.operators
            .iter()
            .filter(move |op| op.bls_public_key.matches(x, y))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operator> {
        self.operators.iter()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}
