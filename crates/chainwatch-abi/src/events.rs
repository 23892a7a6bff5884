//! The three protocol events the exporter listens to.

use alloy_json_abi::JsonAbi;
use alloy_primitives::B256;

use crate::error::ResolveError;

/// Kind of a classified protocol log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `BatchConfirmed(bytes32 indexed batchHeaderHash, uint32 batchId)` on the service manager.
    BatchConfirmed,
    /// `OperatorAddedToQuorums(address,bytes32,bytes)` on the BLS APK registry.
    OperatorAddedToQuorums,
    /// `OperatorRemovedFromQuorums(address,bytes32,bytes)` on the BLS APK registry.
    OperatorRemovedFromQuorums,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        Self::BatchConfirmed,
        Self::OperatorAddedToQuorums,
        Self::OperatorRemovedFromQuorums,
    ];

    /// Event name as declared in the ABI.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BatchConfirmed => "BatchConfirmed",
            Self::OperatorAddedToQuorums => "OperatorAddedToQuorums",
            Self::OperatorRemovedFromQuorums => "OperatorRemovedFromQuorums",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// topic0 hashes of the three events, computed from the ABIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSignatures {
    pub batch_confirmed: B256,
    pub operator_added: B256,
    pub operator_removed: B256,
}

impl EventSignatures {
    pub fn from_abis(service_manager: &JsonAbi, registry: &JsonAbi) -> Result<Self, ResolveError> {
        Ok(Self {
            batch_confirmed: topic(service_manager, "service manager", EventKind::BatchConfirmed)?,
            operator_added: topic(registry, "BLS APK registry", EventKind::OperatorAddedToQuorums)?,
            operator_removed: topic(registry, "BLS APK registry", EventKind::OperatorRemovedFromQuorums)?,
        })
    }

    pub fn topic(&self, kind: EventKind) -> B256 {
        match kind {
            EventKind::BatchConfirmed => self.batch_confirmed,
            EventKind::OperatorAddedToQuorums => self.operator_added,
            EventKind::OperatorRemovedFromQuorums => self.operator_removed,
        }
    }

    /// Match a topic0 against the known events.
    pub fn kind_of(&self, topic0: &B256) -> Option<EventKind> {
        EventKind::ALL.into_iter().find(|k| self.topic(*k) == *topic0)
    }

    /// All three topics, for the log filter.
    pub fn topics(&self) -> Vec<B256> {
        EventKind::ALL.iter().map(|k| self.topic(*k)).collect()
    }
}

fn topic(abi: &JsonAbi, contract: &'static str, kind: EventKind) -> Result<B256, ResolveError> {
    abi.event(kind.name())
        .and_then(|events| events.first())
        .map(|event| event.selector())
        .ok_or(ResolveError::MissingEvent {
            contract,
            name: kind.name(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::{BLS_APK_REGISTRY_ABI, SERVICE_MANAGER_ABI};
    use alloy_primitives::keccak256;

    fn signatures() -> EventSignatures {
        let sm: JsonAbi = serde_json::from_str(SERVICE_MANAGER_ABI).unwrap();
        let reg: JsonAbi = serde_json::from_str(BLS_APK_REGISTRY_ABI).unwrap();
        EventSignatures::from_abis(&sm, &reg).unwrap()
    }

    #[test]
    fn topics_are_keccak_of_canonical_signature() {
        let sigs = signatures();
        assert_eq!(sigs.batch_confirmed, keccak256("BatchConfirmed(bytes32,uint32)"));
        assert_eq!(
            sigs.operator_added,
            keccak256("OperatorAddedToQuorums(address,bytes32,bytes)")
        );
        assert_eq!(
            sigs.operator_removed,
            keccak256("OperatorRemovedFromQuorums(address,bytes32,bytes)")
        );
    }

    #[test]
    fn kind_of_round_trips_and_rejects_unknown() {
        let sigs = signatures();
        for kind in EventKind::ALL {
            assert_eq!(sigs.kind_of(&sigs.topic(kind)), Some(kind));
        }
        assert_eq!(sigs.kind_of(&B256::ZERO), None);
        assert_eq!(sigs.topics().len(), 3);
    }

    #[test]
    fn missing_event_is_reported() {
        let empty = JsonAbi::default();
        let reg: JsonAbi = serde_json::from_str(BLS_APK_REGISTRY_ABI).unwrap();
        let err = EventSignatures::from_abis(&empty, &reg).unwrap_err();
        assert!(matches!(err, ResolveError::MissingEvent { name: "BatchConfirmed", .. }));
    }
}
