//! Chain data types shared by the client, decoder and exporter.

use alloy_primitives::{Address, Bytes, B256};

// ─── LogEntry ─────────────────────────────────────────────────────────────────

/// One on-chain log record as returned by `eth_getLogs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Contract that emitted the log.
    pub address: Address,
    /// topics[0] is the event signature hash.
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed parameters.
    pub data: Bytes,
    pub block_number: u64,
    pub tx_index: u64,
    pub log_index: u64,
    pub tx_hash: B256,
}

impl LogEntry {
    /// The event signature hash, if the log has any topics.
    pub fn topic0(&self) -> Option<&B256> {
        self.topics.first()
    }

    /// Processing order key: block number, then transaction index, then log index.
    pub fn order_key(&self) -> (u64, u64, u64) {
        (self.block_number, self.tx_index, self.log_index)
    }
}

// ─── Transaction ──────────────────────────────────────────────────────────────

/// The subset of a transaction the exporter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub hash: B256,
    /// Calldata: 4-byte selector followed by the ABI-encoded arguments.
    pub input: Bytes,
    /// `None` while the transaction is pending.
    pub block_number: Option<u64>,
}

impl Transaction {
    /// The 4-byte function selector, or `None` if the input is too short.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.input.get(..4).and_then(|s| s.try_into().ok())
    }

    /// The calldata after the selector (empty if the input is too short).
    pub fn args(&self) -> &[u8] {
        self.input.get(4..).unwrap_or_default()
    }
}

// ─── LogFilter ────────────────────────────────────────────────────────────────

/// An `eth_getLogs` query over an inclusive block range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub from_block: u64,
    pub to_block: u64,
    /// Emitting contracts (OR).
    pub addresses: Vec<Address>,
    /// Accepted topic0 values (OR).
    pub topic0: Vec<B256>,
}

impl LogFilter {
    /// Returns `true` if `log` falls in the range and matches the address and topic0 sets.
    pub fn matches(&self, log: &LogEntry) -> bool {
        (self.from_block..=self.to_block).contains(&log.block_number)
            && (self.addresses.is_empty() || self.addresses.contains(&log.address))
            && (self.topic0.is_empty()
                || log.topic0().is_some_and(|t| self.topic0.contains(t)))
    }
}
