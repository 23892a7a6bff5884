//! Runs every deployment task to completion under one cancellation token.

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use chainwatch_core::{Config, ProtocolEnv};

use crate::error::ExporterError;
use crate::metrics::ExporterMetrics;
use crate::task::{DeploymentTask, EigenDaTask, Services};

pub struct Supervisor {
    tasks: Vec<Box<dyn DeploymentTask>>,
    metrics: ExporterMetrics,
}

impl Supervisor {
    pub fn new(metrics: ExporterMetrics) -> Self {
        Self { tasks: vec![], metrics }
    }

    /// One [`EigenDaTask`] per protocol environment referenced by the config.
    pub fn from_config(config: &Config, services: Services) -> Result<Self, ExporterError> {
        let mut supervisor = Self::new(services.metrics.clone());
        for env in config.protocol_envs()? {
            supervisor.add(Box::new(EigenDaTask::from_config(env, config, services.clone())?));
        }
        Ok(supervisor)
    }

    pub fn add(&mut self, task: Box<dyn DeploymentTask>) {
        self.tasks.push(task);
    }

    pub fn envs(&self) -> Vec<ProtocolEnv> {
        self.tasks.iter().map(|t| t.env()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Spawn every task and wait for all of them.
    ///
    /// The first task error cancels the others and is returned once they have
    /// all stopped. `exporter_up` is reset to 0 for every deployment on exit.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ExporterError> {
        let envs = self.envs();
        let mut set = JoinSet::new();
        for task in self.tasks {
            let env = task.env();
            let token = cancel.clone();
            tracing::info!(deployment = %env, "starting deployment task");
            set.spawn(async move { (env, task.run(token).await) });
        }

        let mut first_error: Option<ExporterError> = None;
        while let Some(joined) = set.join_next().await {
            let failure = match joined {
                Ok((env, Ok(()))) => {
                    tracing::info!(deployment = %env, "deployment task finished");
                    None
                }
                Ok((env, Err(e))) => {
                    tracing::error!(deployment = %env, error = %e, "deployment task failed");
                    Some(e)
                }
                Err(e) => {
                    tracing::error!(error = %e, "deployment task panicked");
                    Some(ExporterError::from(e))
                }
            };
            if let Some(e) = failure {
                cancel.cancel();
                first_error.get_or_insert(e);
            }
        }

        for env in envs {
            self.metrics.set_up(env, false);
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
