//! ChainWatch: EigenDA operator exporter.
//!
//! # Commands
//! ```text
//! chainwatch run     --config eoe-config.yml [--metrics-addr 0.0.0.0:9090]
//! chainwatch version
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use chainwatch_abi::ContractResolver;
use chainwatch_core::Config;
use chainwatch_exporter::{ExporterMetrics, Services, Supervisor};
use chainwatch_rpc::ClientRegistry;

mod logging;
mod server;

#[derive(Parser)]
#[command(
    name = "chainwatch",
    about = "ChainWatch EigenDA operator exporter",
    long_about = "
Watches EigenDA deployments on Holesky and Mainnet for batch confirmations and
quorum membership changes of the configured operators, and exposes the results
as Prometheus metrics.

ENVIRONMENT VARIABLES:
  RUST_LOG    Overrides the configured log level (tracing EnvFilter syntax)
",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the exporter until SIGINT or SIGTERM
    Run {
        /// Path to the YAML config file
        #[arg(short, long, default_value = "eoe-config.yml")]
        config: PathBuf,
        /// Listen address of the metrics endpoint (overrides `metricsAddr`)
        #[arg(long)]
        metrics_addr: Option<String>,
    },

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, metrics_addr } => cmd_run(config, metrics_addr).await,
        Commands::Version => {
            println!("chainwatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn cmd_run(path: PathBuf, metrics_addr: Option<String>) -> Result<()> {
    let mut config =
        Config::from_path(&path).with_context(|| format!("failed to load config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    if let Some(addr) = metrics_addr {
        config.metrics_addr = addr;
    }

    logging::init_tracing(config.log_level()?, config.log_json);

    let registry = prometheus::Registry::new();
    let metrics = ExporterMetrics::new(&registry).context("failed to register metrics")?;
    let services = Services {
        registry: Arc::new(ClientRegistry::from_config(&config)),
        resolver: Arc::new(ContractResolver::new().context("failed to load embedded ABIs")?),
        metrics,
    };
    let supervisor = Supervisor::from_config(&config, services)?;

    tracing::info!(
        config = %path.display(),
        operators = config.operators.len(),
        deployments = ?supervisor.envs().iter().map(|e| e.tag()).collect::<Vec<_>>(),
        metrics_addr = %config.metrics_addr,
        "starting chainwatch"
    );

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    let listener = TcpListener::bind(&config.metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics endpoint {}", config.metrics_addr))?;
    let server = tokio::spawn(server::serve(listener, registry, cancel.clone()));

    if supervisor.is_empty() {
        tracing::warn!("no deployments configured, serving metrics only");
        cancel.cancelled().await;
    }
    let result = supervisor.run(cancel.clone()).await;
    cancel.cancel();

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "metrics server failed"),
        Err(e) => tracing::error!(error = %e, "metrics server panicked"),
    }
    result.context("exporter stopped on a fatal error")?;
    tracing::info!("chainwatch stopped");
    Ok(())
}

/// Cancel `token` on the first SIGINT or SIGTERM.
async fn shutdown_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
        _ = token.cancelled() => return,
    }
    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults_to_local_config() {
        let cli = Cli::try_parse_from(["chainwatch", "run"]).unwrap();
        match cli.command {
            Commands::Run { config, metrics_addr } => {
                assert_eq!(config, PathBuf::from("eoe-config.yml"));
                assert!(metrics_addr.is_none());
            }
            Commands::Version => panic!("expected run"),
        }
    }

    #[test]
    fn run_accepts_overrides() {
        let cli = Cli::try_parse_from(["chainwatch", "run", "-c", "/etc/eoe.yml", "--metrics-addr", "127.0.0.1:9100"])
            .unwrap();
        let Commands::Run { config, metrics_addr } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(config, PathBuf::from("/etc/eoe.yml"));
        assert_eq!(metrics_addr.as_deref(), Some("127.0.0.1:9100"));
    }

    #[test]
    fn version_subcommand_parses() {
        let cli = Cli::try_parse_from(["chainwatch", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }
}
