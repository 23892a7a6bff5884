//! EigenDA event handlers.

use async_trait::async_trait;

use chainwatch_abi::{decode_batch_confirmation, decode_quorum_event, DecodeError, EventKind, CONFIRM_BATCH};
use chainwatch_core::LogEntry;
use chainwatch_rpc::TransportError;

use crate::error::ExporterError;
use crate::handler::{EventHandler, HandlerContext};

/// `BatchConfirmed`: counts the batch, then charges a missed batch to every
/// roster operator whose BLS key appears among the non-signers.
pub struct BatchConfirmedHandler;

#[async_trait]
impl EventHandler for BatchConfirmedHandler {
    async fn handle(&self, log: &LogEntry, ctx: &HandlerContext) -> Result<(), ExporterError> {
        let network = ctx.network();
        ctx.metrics.inc_batches_total(network);
        tracing::info!(
            deployment = %ctx.env(),
            block = log.block_number,
            tx_hash = %log.tx_hash,
            "batch confirmed"
        );

        let tx = match ctx.client.transaction_by_hash(log.tx_hash).await {
            Ok(tx) => tx,
            Err(TransportError::TransactionNotFound(hash)) => {
                tracing::warn!(
                    deployment = %ctx.env(),
                    block = log.block_number,
                    tx_hash = %hash,
                    "confirming transaction not found, skipping"
                );
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let expected = ctx
            .deployment
            .confirm_batch_selector()
            .ok_or_else(|| DecodeError::MethodNotFound {
                name: CONFIRM_BATCH.to_string(),
            })?;
        if tx.selector() != Some(expected) {
            tracing::debug!(
                deployment = %ctx.env(),
                tx_hash = %log.tx_hash,
                "transaction is not a confirmBatch call"
            );
            return Ok(());
        }

        let record = decode_batch_confirmation(&ctx.deployment, tx.args())?;
        for key in &record.non_signer_pubkeys {
            for operator in ctx.roster.find_by_pubkey(&key.x, &key.y) {
                ctx.metrics.inc_missed_batch(&operator.name, network);
                tracing::info!(
                    deployment = %ctx.env(),
                    block = log.block_number,
                    tx_index = log.tx_index,
                    operator = %operator.name,
                    "operator failed to sign batch"
                );
            }
        }
        Ok(())
    }

    fn kind(&self) -> EventKind {
        EventKind::BatchConfirmed
    }
}

/// `OperatorAddedToQuorums` / `OperatorRemovedFromQuorums`: flips the quorum
/// gauge of a roster operator. Unknown operators are ignored.
pub struct QuorumMembershipHandler {
    kind: EventKind,
    member: bool,
}

impl QuorumMembershipHandler {
    pub fn added() -> Self {
        Self {
            kind: EventKind::OperatorAddedToQuorums,
            member: true,
        }
    }

    pub fn removed() -> Self {
        Self {
            kind: EventKind::OperatorRemovedFromQuorums,
            member: false,
        }
    }
}

#[async_trait]
impl EventHandler for QuorumMembershipHandler {
    async fn handle(&self, log: &LogEntry, ctx: &HandlerContext) -> Result<(), ExporterError> {
        let change = decode_quorum_event(&ctx.deployment, self.kind, &log.data)?;
        let Some(operator) = ctx.roster.find_by_address(&change.operator) else {
            tracing::debug!(
                deployment = %ctx.env(),
                operator = %change.operator,
                event = %self.kind,
                "quorum change for untracked operator"
            );
            return Ok(());
        };

        for quorum in &change.quorums {
            ctx.metrics.set_quorum_status(&operator.name, ctx.network(), *quorum, self.member);
            tracing::info!(
                deployment = %ctx.env(),
                block = log.block_number,
                operator = %operator.name,
                quorum,
                member = self.member,
                "operator quorum membership changed"
            );
        }
        Ok(())
    }

    fn kind(&self) -> EventKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Arc;

    use alloy_primitives::{Address, B256, U256};
    use chainwatch_abi::fixtures::{confirm_batch_calldata, quorum_event_data};
    use chainwatch_abi::{ContractResolver, G1Point};
    use chainwatch_core::{BlsPublicKey, ContractOverrides, Network, Operator, ProtocolEnv, Roster, Transaction};
    use chainwatch_rpc::mock::MockChainClient;
    use prometheus::core::Collector;

    use crate::metrics::ExporterMetrics;

    const OP: &str = "nethermind";

    fn key() -> G1Point {
        G1Point {
            x: U256::from(1111),
            y: U256::from(2222),
        }
    }

    fn ctx(client: Arc<MockChainClient>) -> HandlerContext {
        let op = Operator {
            name: OP.into(),
            address: Address::repeat_byte(0x57),
            bls_public_key: BlsPublicKey::new(key().x, key().y),
            envs: BTreeSet::from([ProtocolEnv::EigenDaHolesky]),
            bootstrap_quorums: BTreeMap::new(),
        };
        HandlerContext {
            deployment: ContractResolver::new()
                .unwrap()
                .resolve(ProtocolEnv::EigenDaHolesky, ContractOverrides::default()),
            roster: Arc::new(Roster::for_env(ProtocolEnv::EigenDaHolesky, [&op])),
            client,
            metrics: ExporterMetrics::new(&prometheus::Registry::new()).unwrap(),
        }
    }

    fn log(data: Vec<u8>) -> LogEntry {
        LogEntry {
            address: Address::ZERO,
            topics: vec![B256::ZERO],
            data: data.into(),
            block_number: 7,
            tx_index: 0,
            log_index: 0,
            tx_hash: B256::repeat_byte(0xcc),
        }
    }

    fn missed(ctx: &HandlerContext) -> u64 {
        ctx.metrics
            .operator_batches
            .with_label_values(&[OP, "holesky", "missed"])
            .get()
    }

    #[tokio::test]
    async fn partial_key_match_does_not_count() {
        let client = Arc::new(MockChainClient::for_network(Network::Holesky));
        let ctx = ctx(client.clone());
        let selector = ctx.deployment.confirm_batch_selector().unwrap();
        let half = G1Point {
            x: key().x,
            y: U256::from(9),
        };
        client.push_tx(Transaction {
            hash: B256::repeat_byte(0xcc),
            input: confirm_batch_calldata(selector, &[half]).into(),
            block_number: Some(7),
        });

        BatchConfirmedHandler.handle(&log(vec![]), &ctx).await.unwrap();
        assert_eq!(missed(&ctx), 0);
        assert_eq!(ctx.metrics.batches_total.with_label_values(&["holesky"]).get(), 1);
    }

    #[tokio::test]
    async fn missing_transaction_is_skipped() {
        let client = Arc::new(MockChainClient::for_network(Network::Holesky));
        let ctx = ctx(client.clone());
        BatchConfirmedHandler.handle(&log(vec![]), &ctx).await.unwrap();
        assert_eq!(client.tx_calls(), 1);
        assert_eq!(ctx.metrics.batches_total.with_label_values(&["holesky"]).get(), 1);
        assert_eq!(missed(&ctx), 0);
    }

    #[tokio::test]
    async fn short_input_is_ignored() {
        let client = Arc::new(MockChainClient::for_network(Network::Holesky));
        let ctx = ctx(client.clone());
        client.push_tx(Transaction {
            hash: B256::repeat_byte(0xcc),
            input: vec![0x01, 0x02].into(),
            block_number: Some(7),
        });
        BatchConfirmedHandler.handle(&log(vec![]), &ctx).await.unwrap();
        assert_eq!(missed(&ctx), 0);
    }

    #[tokio::test]
    async fn corrupt_calldata_is_a_decode_error() {
        let client = Arc::new(MockChainClient::for_network(Network::Holesky));
        let ctx = ctx(client.clone());
        let mut input = ctx.deployment.confirm_batch_selector().unwrap().to_vec();
        input.extend([0u8; 10]);
        client.push_tx(Transaction {
            hash: B256::repeat_byte(0xcc),
            input: input.into(),
            block_number: Some(7),
        });
        let err = BatchConfirmedHandler.handle(&log(vec![]), &ctx).await.unwrap_err();
        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn untracked_operator_is_ignored() {
        let client = Arc::new(MockChainClient::for_network(Network::Holesky));
        let ctx = ctx(client);
        let data = quorum_event_data(Address::repeat_byte(0x99), &[0]);
        QuorumMembershipHandler::added().handle(&log(data), &ctx).await.unwrap();
        let families = ctx.metrics.quorum_status.collect();
        assert!(families.iter().all(|f| f.get_metric().is_empty()));
    }

    #[tokio::test]
    async fn add_then_remove_flips_gauge() {
        let client = Arc::new(MockChainClient::for_network(Network::Holesky));
        let ctx = ctx(client);
        let op = Address::repeat_byte(0x57);
        QuorumMembershipHandler::added()
            .handle(&log(quorum_event_data(op, &[1])), &ctx)
            .await
            .unwrap();
        let gauge = ctx.metrics.quorum_status.with_label_values(&[OP, "holesky", "1"]);
        assert_eq!(gauge.get(), 1);
        QuorumMembershipHandler::removed()
            .handle(&log(quorum_event_data(op, &[1])), &ctx)
            .await
            .unwrap();
        assert_eq!(gauge.get(), 0);
    }
}
