//! Event handler trait + registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use chainwatch_abi::{Deployment, EventKind};
use chainwatch_core::{LogEntry, Network, ProtocolEnv, Roster};
use chainwatch_rpc::ChainClient;

use crate::error::ExporterError;
use crate::metrics::ExporterMetrics;

/// Everything a handler may touch while processing one deployment's logs.
#[derive(Clone)]
pub struct HandlerContext {
    pub deployment: Arc<Deployment>,
    pub roster: Arc<Roster>,
    pub client: Arc<dyn ChainClient>,
    pub metrics: ExporterMetrics,
}

impl HandlerContext {
    pub fn env(&self) -> ProtocolEnv {
        self.deployment.env()
    }

    pub fn network(&self) -> Network {
        self.deployment.network()
    }
}

/// Processes one classified log.
///
/// Return [`ExporterError::Decode`] to skip the entry; any chain error aborts
/// the current tick.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, log: &LogEntry, ctx: &HandlerContext) -> Result<(), ExporterError>;

    /// The event kind this handler processes.
    fn kind(&self) -> EventKind;
}

/// Routes classified logs to their handlers.
pub struct HandlerRegistry {
    handlers: HashMap<EventKind, Vec<Arc<dyn EventHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with the three EigenDA handlers.
    pub fn eigenda() -> Self {
        let mut registry = Self::new();
        registry.on_event(Arc::new(crate::handlers::BatchConfirmedHandler));
        registry.on_event(Arc::new(crate::handlers::QuorumMembershipHandler::added()));
        registry.on_event(Arc::new(crate::handlers::QuorumMembershipHandler::removed()));
        registry
    }

    pub fn on_event(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.entry(handler.kind()).or_default().push(handler);
    }

    /// Run every handler registered for `kind`, in registration order.
    pub async fn dispatch(
        &self,
        kind: EventKind,
        log: &LogEntry,
        ctx: &HandlerContext,
    ) -> Result<(), ExporterError> {
        if let Some(handlers) = self.handlers.get(&kind) {
            for handler in handlers {
                handler.handle(log, ctx).await?;
            }
        }
        Ok(())
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_abi::ContractResolver;
    use chainwatch_core::ContractOverrides;
    use chainwatch_rpc::mock::MockChainClient;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Counter(Arc<AtomicU32>, EventKind);

    #[async_trait]
    impl EventHandler for Counter {
        async fn handle(&self, _log: &LogEntry, _ctx: &HandlerContext) -> Result<(), ExporterError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn kind(&self) -> EventKind {
            self.1
        }
    }

    fn ctx() -> HandlerContext {
        let deployment = ContractResolver::new()
            .unwrap()
            .resolve(ProtocolEnv::EigenDaHolesky, ContractOverrides::default());
        HandlerContext {
            deployment,
            roster: Arc::new(Roster::for_env(
                ProtocolEnv::EigenDaHolesky,
                std::iter::empty::<&chainwatch_core::Operator>(),
            )),
            client: Arc::new(MockChainClient::for_network(Network::Holesky)),
            metrics: ExporterMetrics::new(&prometheus::Registry::new()).unwrap(),
        }
    }

    fn log() -> LogEntry {
        LogEntry {
            address: Default::default(),
            topics: vec![],
            data: Default::default(),
            block_number: 1,
            tx_index: 0,
            log_index: 0,
            tx_hash: Default::default(),
        }
    }

    #[tokio::test]
    async fn dispatch_only_reaches_matching_kind() {
        let count = Arc::new(AtomicU32::new(0));
        let mut registry = HandlerRegistry::new();
        registry.on_event(Arc::new(Counter(count.clone(), EventKind::BatchConfirmed)));

        let ctx = ctx();
        registry.dispatch(EventKind::BatchConfirmed, &log(), &ctx).await.unwrap();
        registry
            .dispatch(EventKind::OperatorAddedToQuorums, &log(), &ctx)
            .await
            .unwrap();

        assert_eq!(count.load(Ordering::Relaxed), 1);
    }
}
