//! One shared [`ChainClient`] per network, created lazily.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OnceCell};

use chainwatch_core::{Config, ConfigError, Network};

use crate::client::{ChainClient, EvmChainClient};
use crate::error::{RegistryError, TransportError};
use crate::retry::{RetryConfig, RetryPolicy};
use crate::transport::HttpTransport;

/// Builds a client for one endpoint.
pub trait ClientFactory: Send + Sync {
    fn build(&self, network: Network, url: &str) -> Result<Arc<dyn ChainClient>, TransportError>;
}

/// Default factory: HTTP transport wrapped in an [`EvmChainClient`].
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    pub retry: RetryConfig,
    pub request_timeout: Duration,
}

impl Default for HttpClientFactory {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientFactory for HttpClientFactory {
    fn build(&self, network: Network, url: &str) -> Result<Arc<dyn ChainClient>, TransportError> {
        let transport = HttpTransport::new(url, self.request_timeout)?;
        let client = EvmChainClient::new(network, transport, RetryPolicy::new(self.retry.clone()));
        Ok(Arc::new(client))
    }
}

type ClientSlot = Arc<OnceCell<Arc<dyn ChainClient>>>;

/// Network-keyed client cache.
///
/// Two deployments on the same network receive the same `Arc`. A client is
/// only cached after the endpoint reported the expected chain id. The map
/// lock only guards slot lookup; connecting happens inside the network's own
/// slot, so a slow endpoint never holds up another network.
pub struct ClientRegistry {
    rpcs: HashMap<String, String>,
    factory: Arc<dyn ClientFactory>,
    clients: Mutex<HashMap<Network, ClientSlot>>,
}

impl ClientRegistry {
    pub fn new(rpcs: HashMap<String, String>, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            rpcs,
            factory,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Registry over the config's `rpcs` map with the HTTP factory and the
    /// configured retry budget.
    pub fn from_config(config: &Config) -> Self {
        let factory = HttpClientFactory {
            retry: RetryConfig::from(&config.retry),
            ..Default::default()
        };
        Self::new(config.rpcs.clone(), Arc::new(factory))
    }

    /// Pre-seed the cache, bypassing the factory and the chain id check.
    pub async fn with_client(self, network: Network, client: Arc<dyn ChainClient>) -> Self {
        self.clients
            .lock()
            .await
            .insert(network, Arc::new(OnceCell::new_with(Some(client))));
        self
    }

    /// The client for `network`, creating it on first use.
    ///
    /// Concurrent callers for the same network wait for a single connect
    /// attempt. A failed attempt leaves the slot empty for the next caller.
    pub async fn get(&self, network: Network) -> Result<Arc<dyn ChainClient>, RegistryError> {
        let slot = Arc::clone(self.clients.lock().await.entry(network).or_default());
        let client = slot.get_or_try_init(|| self.connect(network)).await?;
        Ok(Arc::clone(client))
    }

    async fn connect(&self, network: Network) -> Result<Arc<dyn ChainClient>, RegistryError> {
        let url = self.rpcs.get(network.name()).ok_or_else(|| ConfigError::MissingRpcUrl {
            network: network.name().to_string(),
        })?;
        let connect_err = |source| RegistryError::Connect {
            network: network.name().to_string(),
            source,
        };

        let client = self.factory.build(network, url).map_err(connect_err)?;
        let chain_id = client.chain_id().await.map_err(connect_err)?;
        network.assert_chain_id(chain_id)?;

        tracing::info!(network = %network, chain_id, "chain client ready");
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChainClient;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockFactory {
        chain_id: u64,
        builds: AtomicU32,
        slow: HashMap<Network, Duration>,
    }

    impl MockFactory {
        fn new(chain_id: u64) -> Arc<Self> {
            Arc::new(Self {
                chain_id,
                builds: AtomicU32::new(0),
                slow: HashMap::new(),
            })
        }
    }

    impl ClientFactory for MockFactory {
        fn build(&self, network: Network, _url: &str) -> Result<Arc<dyn ChainClient>, TransportError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            let client = MockChainClient::new();
            client.set_chain_id(self.chain_id);
            if let Some(delay) = self.slow.get(&network) {
                client.delay_chain_id(*delay);
            }
            Ok(Arc::new(client))
        }
    }

    /// Answers with each network's real chain id.
    struct PerNetworkFactory {
        slow: HashMap<Network, Duration>,
    }

    impl ClientFactory for PerNetworkFactory {
        fn build(&self, network: Network, _url: &str) -> Result<Arc<dyn ChainClient>, TransportError> {
            let client = MockChainClient::for_network(network);
            if let Some(delay) = self.slow.get(&network) {
                client.delay_chain_id(*delay);
            }
            Ok(Arc::new(client))
        }
    }

    fn rpcs() -> HashMap<String, String> {
        HashMap::from([("holesky".to_string(), "http://holesky.invalid".to_string())])
    }

    #[tokio::test]
    async fn same_network_shares_one_client() {
        let factory = MockFactory::new(17_000);
        let registry = ClientRegistry::new(rpcs(), factory.clone());
        let a = registry.get(Network::Holesky).await.unwrap();
        let b = registry.get(Network::Holesky).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_url_is_config_error() {
        let registry = ClientRegistry::new(rpcs(), MockFactory::new(1));
        let err = registry.get(Network::Mainnet).await.err().unwrap();
        assert!(matches!(
            err,
            RegistryError::Config(ConfigError::MissingRpcUrl { ref network }) if network == "mainnet"
        ));
    }

    #[tokio::test]
    async fn wrong_chain_id_is_rejected_and_not_cached() {
        let factory = MockFactory::new(1);
        let registry = ClientRegistry::new(rpcs(), factory.clone());
        let err = registry.get(Network::Holesky).await.err().unwrap();
        assert!(matches!(
            err,
            RegistryError::Config(ConfigError::ChainIdMismatch { expected: 17_000, actual: 1, .. })
        ));
        let _ = registry.get(Network::Holesky).await;
        assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn seeded_client_is_returned() {
        let mock: Arc<dyn ChainClient> = Arc::new(MockChainClient::new());
        let registry = ClientRegistry::new(HashMap::new(), MockFactory::new(1))
            .with_client(Network::Mainnet, Arc::clone(&mock))
            .await;
        let got = registry.get(Network::Mainnet).await.unwrap();
        assert!(Arc::ptr_eq(&got, &mock));
    }

    #[tokio::test]
    async fn slow_network_does_not_block_another() {
        let rpcs = HashMap::from([
            ("holesky".to_string(), "http://holesky.invalid".to_string()),
            ("mainnet".to_string(), "http://mainnet.invalid".to_string()),
        ]);
        let factory = PerNetworkFactory {
            slow: HashMap::from([(Network::Holesky, Duration::from_secs(5))]),
        };
        let registry = Arc::new(ClientRegistry::new(rpcs, Arc::new(factory)));

        let holesky = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move { registry.get(Network::Holesky).await.map(|_| ()) }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mainnet = tokio::time::timeout(Duration::from_secs(1), registry.get(Network::Mainnet))
            .await
            .expect("mainnet waited on the holesky connect");
        assert_eq!(mainnet.unwrap().chain_id().await.unwrap(), 1);
        assert!(!holesky.is_finished());
        holesky.abort();
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_connect() {
        let factory = Arc::new(MockFactory {
            chain_id: 17_000,
            builds: AtomicU32::new(0),
            slow: HashMap::from([(Network::Holesky, Duration::from_millis(100))]),
        });
        let registry = ClientRegistry::new(rpcs(), factory.clone());
        let (a, b) = tokio::join!(registry.get(Network::Holesky), registry.get(Network::Holesky));
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    }
}
