//! Deployment tasks: the unit the supervisor runs, one per protocol environment.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use chainwatch_abi::ContractResolver;
use chainwatch_core::{Config, ContractOverrides, ProtocolEnv, Roster};
use chainwatch_rpc::ClientRegistry;

use crate::error::ExporterError;
use crate::handler::{HandlerContext, HandlerRegistry};
use crate::metrics::ExporterMetrics;
use crate::poll_loop::{PollConfig, PollLoop};

/// A long-running deployment pipeline.
///
/// `run` returns `Ok(())` only once `cancel` has fired; any error is fatal
/// to the process.
#[async_trait]
pub trait DeploymentTask: Send + 'static {
    fn env(&self) -> ProtocolEnv;

    async fn run(self: Box<Self>, cancel: CancellationToken) -> Result<(), ExporterError>;
}

/// Handles shared by every deployment of the process.
#[derive(Clone)]
pub struct Services {
    pub registry: Arc<ClientRegistry>,
    pub resolver: Arc<ContractResolver>,
    pub metrics: ExporterMetrics,
}

/// The EigenDA pipeline for one protocol environment.
pub struct EigenDaTask {
    env: ProtocolEnv,
    roster: Arc<Roster>,
    overrides: ContractOverrides,
    poll: PollConfig,
    services: Services,
}

impl EigenDaTask {
    pub fn new(
        env: ProtocolEnv,
        roster: Roster,
        overrides: ContractOverrides,
        poll: PollConfig,
        services: Services,
    ) -> Self {
        Self {
            env,
            roster: Arc::new(roster),
            overrides,
            poll,
            services,
        }
    }

    /// Build the task for `env` from a validated config.
    pub fn from_config(env: ProtocolEnv, config: &Config, services: Services) -> Result<Self, ExporterError> {
        let operators = config.operators()?;
        let roster = Roster::for_env(env, operators.iter());
        let poll = PollConfig {
            interval: config.poll_interval(),
            start_block: config.start_block(env),
            ..Default::default()
        };
        Ok(Self::new(env, roster, config.contract_overrides(env)?, poll, services))
    }

    /// Resolve the deployment, acquire the network's client and run the
    /// initializing phase.
    async fn start(&self) -> Result<PollLoop, ExporterError> {
        let deployment = self.services.resolver.resolve(self.env, self.overrides);
        let client = self.services.registry.get(deployment.network()).await?;
        let ctx = HandlerContext {
            deployment,
            roster: Arc::clone(&self.roster),
            client,
            metrics: self.services.metrics.clone(),
        };
        PollLoop::start(ctx, HandlerRegistry::eigenda(), self.poll.clone()).await
    }
}

#[async_trait]
impl DeploymentTask for EigenDaTask {
    fn env(&self) -> ProtocolEnv {
        self.env
    }

    async fn run(self: Box<Self>, cancel: CancellationToken) -> Result<(), ExporterError> {
        let mut poll = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            started = self.start() => started?,
        };
        poll.run(cancel).await
    }
}
