//! Orders a page of raw logs and tags each one with its event kind.

use chainwatch_abi::{EventKind, EventSignatures};
use chainwatch_core::LogEntry;

/// Sort `logs` by (block, tx index, log index) and keep those whose topic0 is
/// one of the known events. Logs without topics are dropped.
pub fn classify(mut logs: Vec<LogEntry>, signatures: &EventSignatures) -> Vec<(LogEntry, EventKind)> {
    logs.sort_by_key(LogEntry::order_key);
    logs.into_iter()
        .filter_map(|log| {
            let kind = log.topic0().and_then(|t| signatures.kind_of(t))?;
            Some((log, kind))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, B256};

    fn sigs() -> EventSignatures {
        EventSignatures {
            batch_confirmed: B256::repeat_byte(1),
            operator_added: B256::repeat_byte(2),
            operator_removed: B256::repeat_byte(3),
        }
    }

    fn log(block: u64, tx: u64, idx: u64, topics: Vec<B256>) -> LogEntry {
        LogEntry {
            address: Address::ZERO,
            topics,
            data: Bytes::new(),
            block_number: block,
            tx_index: tx,
            log_index: idx,
            tx_hash: B256::with_last_byte(tx as u8),
        }
    }

    #[test]
    fn orders_by_block_then_tx_then_log() {
        let t = vec![B256::repeat_byte(1)];
        let out = classify(
            vec![
                log(10, 3, 0, t.clone()),
                log(9, 7, 0, t.clone()),
                log(10, 1, 5, t.clone()),
                log(10, 1, 2, t.clone()),
            ],
            &sigs(),
        );
        let keys: Vec<_> = out.iter().map(|(l, _)| l.order_key()).collect();
        assert_eq!(keys, vec![(9, 7, 0), (10, 1, 2), (10, 1, 5), (10, 3, 0)]);
    }

    #[test]
    fn tags_known_and_drops_unknown() {
        let out = classify(
            vec![
                log(1, 0, 0, vec![B256::repeat_byte(3)]),
                log(1, 0, 1, vec![B256::repeat_byte(9)]),
                log(1, 0, 2, vec![]),
                log(1, 0, 3, vec![B256::repeat_byte(2), B256::ZERO]),
            ],
            &sigs(),
        );
        let kinds: Vec<_> = out.iter().map(|(_, k)| *k).collect();
        assert_eq!(
            kinds,
            vec![EventKind::OperatorRemovedFromQuorums, EventKind::OperatorAddedToQuorums]
        );
    }
}
