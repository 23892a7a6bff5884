//! In-memory [`ChainClient`] for tests.
//!
//! Enabled with `#[cfg(test)]` inside this crate and via the `test-utils`
//! feature for downstream crates.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::B256;
use async_trait::async_trait;

use chainwatch_core::{LogEntry, LogFilter, Network, Transaction};

use crate::client::ChainClient;
use crate::error::TransportError;

#[derive(Default)]
struct MockState {
    head: u64,
    chain_id: u64,
    chain_id_delay: Option<Duration>,
    logs: Vec<LogEntry>,
    txs: HashMap<B256, Transaction>,
    height_failures: VecDeque<TransportError>,
    log_failures: VecDeque<TransportError>,
    filters: Vec<LogFilter>,
    height_calls: u64,
    tx_calls: u64,
}

/// Scriptable chain: a movable head, a static log set and a tx table.
///
/// `filter_logs` answers with every stored log that [`LogFilter::matches`].
/// Queued failures are returned once each, before any real answer.
pub struct MockChainClient {
    state: Mutex<MockState>,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainClient {
    /// A mainnet-flavoured mock at head 0.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                chain_id: Network::Mainnet.chain_id(),
                ..Default::default()
            }),
        }
    }

    pub fn for_network(network: Network) -> Self {
        let client = Self::new();
        client.set_chain_id(network.chain_id());
        client
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_head(&self, head: u64) {
        self.state().head = head;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state().chain_id = chain_id;
    }

    /// Every `chain_id` call sleeps `delay` before answering.
    pub fn delay_chain_id(&self, delay: Duration) {
        self.state().chain_id_delay = Some(delay);
    }

    pub fn push_log(&self, log: LogEntry) {
        self.state().logs.push(log);
    }

    pub fn push_tx(&self, tx: Transaction) {
        self.state().txs.insert(tx.hash, tx);
    }

    /// The next `current_height` call fails with `err`.
    pub fn fail_next_height(&self, err: TransportError) {
        self.state().height_failures.push_back(err);
    }

    /// The next `filter_logs` call fails with `err`.
    pub fn fail_next_logs(&self, err: TransportError) {
        self.state().log_failures.push_back(err);
    }

    /// Every filter passed to `filter_logs`, in call order.
    pub fn filters(&self) -> Vec<LogFilter> {
        self.state().filters.clone()
    }

    pub fn height_calls(&self) -> u64 {
        self.state().height_calls
    }

    pub fn tx_calls(&self) -> u64 {
        self.state().tx_calls
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn current_height(&self) -> Result<u64, TransportError> {
        let mut state = self.state();
        state.height_calls += 1;
        match state.height_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(state.head),
        }
    }

    async fn filter_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, TransportError> {
        let mut state = self.state();
        state.filters.push(filter.clone());
        if let Some(err) = state.log_failures.pop_front() {
            return Err(err);
        }
        Ok(state.logs.iter().filter(|log| filter.matches(log)).cloned().collect())
    }

    async fn transaction_by_hash(&self, hash: B256) -> Result<Transaction, TransportError> {
        let mut state = self.state();
        state.tx_calls += 1;
        state
            .txs
            .get(&hash)
            .cloned()
            .ok_or(TransportError::TransactionNotFound(hash))
    }

    async fn chain_id(&self) -> Result<u64, TransportError> {
        let delay = self.state().chain_id_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.state().chain_id)
    }
}
