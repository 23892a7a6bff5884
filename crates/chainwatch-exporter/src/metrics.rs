//! Prometheus metric definitions.
//!
//! All metrics live in namespace `eoe`, subsystem `eigenda`, and are
//! registered on a caller-owned [`Registry`] rather than the process default.

use chainwatch_core::{Network, ProtocolEnv, QuorumId, Roster};
use prometheus::{IntCounterVec, IntGaugeVec, Opts, Registry};

const NAMESPACE: &str = "eoe";
const SUBSYSTEM: &str = "eigenda";

/// Status label of a batch an operator did not sign.
pub const STATUS_MISSED: &str = "missed";

/// Central metrics handle. Cheap to clone; clones share the same series.
#[derive(Clone)]
pub struct ExporterMetrics {
    /// `exporter_up{deployment}`: 1 while a deployment is polling.
    pub exporter_up: IntGaugeVec,
    /// `exporter_latest_block{network}`: last block of the last processed range.
    pub latest_block: IntGaugeVec,
    /// `onchain_batches_total{network}`
    pub batches_total: IntCounterVec,
    /// `onchain_batches{operator,network,status}`
    pub operator_batches: IntCounterVec,
    /// `onchain_quorum_status{operator,network,quorum}`: 1 = member, 0 = not.
    pub quorum_status: IntGaugeVec,
}

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(NAMESPACE).subsystem(SUBSYSTEM)
}

impl ExporterMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let metrics = Self {
            exporter_up: IntGaugeVec::new(opts("exporter_up", "Status of the exporter"), &["deployment"])?,
            latest_block: IntGaugeVec::new(
                opts("exporter_latest_block", "Latest block number that the exporter has processed"),
                &["network"],
            )?,
            batches_total: IntCounterVec::new(
                opts("onchain_batches_total", "Total number of eigenda onchain batches"),
                &["network"],
            )?,
            operator_batches: IntCounterVec::new(
                opts("onchain_batches", "Number of eigenda onchain batches per operator and status"),
                &["operator", "network", "status"],
            )?,
            quorum_status: IntGaugeVec::new(
                opts("onchain_quorum_status", "Quorum membership of an operator"),
                &["operator", "network", "quorum"],
            )?,
        };
        registry.register(Box::new(metrics.exporter_up.clone()))?;
        registry.register(Box::new(metrics.latest_block.clone()))?;
        registry.register(Box::new(metrics.batches_total.clone()))?;
        registry.register(Box::new(metrics.operator_batches.clone()))?;
        registry.register(Box::new(metrics.quorum_status.clone()))?;
        Ok(metrics)
    }

    pub fn set_up(&self, env: ProtocolEnv, up: bool) {
        self.exporter_up.with_label_values(&[env.tag()]).set(i64::from(up));
    }

    pub fn set_latest_block(&self, network: Network, block: u64) {
        self.latest_block
            .with_label_values(&[network.name()])
            .set(i64::try_from(block).unwrap_or(i64::MAX));
    }

    pub fn inc_batches_total(&self, network: Network) {
        self.batches_total.with_label_values(&[network.name()]).inc();
    }

    pub fn inc_missed_batch(&self, operator: &str, network: Network) {
        self.operator_batches
            .with_label_values(&[operator, network.name(), STATUS_MISSED])
            .inc();
    }

    pub fn set_quorum_status(&self, operator: &str, network: Network, quorum: QuorumId, member: bool) {
        let quorum = quorum.to_string();
        self.quorum_status
            .with_label_values(&[operator, network.name(), quorum.as_str()])
            .set(i64::from(member));
    }

    /// Write every operator's bootstrap quorum map into the quorum gauge.
    pub fn seed_quorum_gauges(&self, roster: &Roster, network: Network) {
        for operator in roster.iter() {
            for (quorum, member) in &operator.bootstrap_quorums {
                self.set_quorum_status(&operator.name, network, *quorum, *member);
            }
        }
    }
}
