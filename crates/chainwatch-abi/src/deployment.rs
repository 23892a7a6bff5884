//! Deployment resolution: contract addresses and parsed ABIs per protocol environment.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{address, Address};

use chainwatch_core::{ContractOverrides, Network, ProtocolEnv};

use crate::error::ResolveError;
use crate::events::EventSignatures;

pub(crate) const SERVICE_MANAGER_ABI: &str = include_str!("../abi/service_manager.json");
pub(crate) const BLS_APK_REGISTRY_ABI: &str = include_str!("../abi/bls_apk_registry.json");

/// Name of the batch confirmation method on the service manager.
pub const CONFIRM_BATCH: &str = "confirmBatch";

/// Known contract addresses of one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub service_manager: Address,
    pub bls_apk_registry: Address,
}

impl ContractAddresses {
    /// Published addresses of `env`.
    pub fn for_env(env: ProtocolEnv) -> Self {
        match env {
            ProtocolEnv::EigenDaHolesky => Self {
                service_manager: address!("D4A7E1Bd8015057293f0D0A557088c286942e84b"),
                bls_apk_registry: address!("066cF95c1bf0927124DFB8B02B401bc23A79730D"),
            },
            ProtocolEnv::EigenDaMainnet => Self {
                service_manager: address!("870679E138bCdf293b7Ff14dD44b70FC97e12fc0"),
                bls_apk_registry: address!("00A5Fd09F6CeE6AE9C8b0E5e33287F7c82880505"),
            },
        }
    }

    fn with_overrides(self, overrides: ContractOverrides) -> Self {
        Self {
            service_manager: overrides.service_manager.unwrap_or(self.service_manager),
            bls_apk_registry: overrides.bls_apk_registry.unwrap_or(self.bls_apk_registry),
        }
    }
}

/// One protocol instance on one network. Immutable once resolved.
#[derive(Debug)]
pub struct Deployment {
    env: ProtocolEnv,
    addresses: ContractAddresses,
    service_manager_abi: Arc<JsonAbi>,
    registry_abi: Arc<JsonAbi>,
    signatures: EventSignatures,
}

impl Deployment {
    pub fn env(&self) -> ProtocolEnv {
        self.env
    }

    pub fn network(&self) -> Network {
        self.env.network()
    }

    pub fn service_manager(&self) -> Address {
        self.addresses.service_manager
    }

    pub fn bls_apk_registry(&self) -> Address {
        self.addresses.bls_apk_registry
    }

    /// Both contracts, in filter order.
    pub fn contract_addresses(&self) -> Vec<Address> {
        vec![self.addresses.service_manager, self.addresses.bls_apk_registry]
    }

    pub fn service_manager_abi(&self) -> &JsonAbi {
        &self.service_manager_abi
    }

    pub fn registry_abi(&self) -> &JsonAbi {
        &self.registry_abi
    }

    pub fn signatures(&self) -> &EventSignatures {
        &self.signatures
    }

    /// `confirmBatch` from the service-manager ABI, if declared.
    pub fn confirm_batch(&self) -> Option<&Function> {
        self.service_manager_abi
            .function(CONFIRM_BATCH)
            .and_then(|overloads| overloads.first())
    }

    /// 4-byte selector of `confirmBatch`.
    pub fn confirm_batch_selector(&self) -> Option<[u8; 4]> {
        self.confirm_batch().map(|f| f.selector().0)
    }
}

/// Lazily resolves and caches one [`Deployment`] per protocol environment.
///
/// ABIs are parsed once and shared by every deployment.
pub struct ContractResolver {
    service_manager_abi: Arc<JsonAbi>,
    registry_abi: Arc<JsonAbi>,
    signatures: EventSignatures,
    resolved: Mutex<HashMap<ProtocolEnv, Arc<Deployment>>>,
}

impl ContractResolver {
    /// Resolver over the embedded EigenDA ABIs.
    pub fn new() -> Result<Self, ResolveError> {
        Self::from_abi_json(SERVICE_MANAGER_ABI, BLS_APK_REGISTRY_ABI)
    }

    pub fn from_abi_json(service_manager: &str, registry: &str) -> Result<Self, ResolveError> {
        let service_manager_abi = parse_abi("service manager", service_manager)?;
        let registry_abi = parse_abi("BLS APK registry", registry)?;
        let signatures = EventSignatures::from_abis(&service_manager_abi, &registry_abi)?;
        Ok(Self {
            service_manager_abi: Arc::new(service_manager_abi),
            registry_abi: Arc::new(registry_abi),
            signatures,
            resolved: Mutex::new(HashMap::new()),
        })
    }

    /// The deployment for `env`. The first call fixes the addresses; later
    /// overrides for the same env are ignored.
    pub fn resolve(&self, env: ProtocolEnv, overrides: ContractOverrides) -> Arc<Deployment> {
        let mut resolved = self.resolved.lock().unwrap_or_else(PoisonError::into_inner);
        let deployment = resolved.entry(env).or_insert_with(|| {
            let addresses = ContractAddresses::for_env(env).with_overrides(overrides);
            tracing::debug!(
                deployment = %env,
                service_manager = %addresses.service_manager,
                bls_apk_registry = %addresses.bls_apk_registry,
                "deployment resolved"
            );
            Arc::new(Deployment {
                env,
                addresses,
                service_manager_abi: Arc::clone(&self.service_manager_abi),
                registry_abi: Arc::clone(&self.registry_abi),
                signatures: self.signatures,
            })
        });
        Arc::clone(deployment)
    }
}

fn parse_abi(contract: &'static str, json: &str) -> Result<JsonAbi, ResolveError> {
    serde_json::from_str(json).map_err(|e| ResolveError::InvalidAbi {
        contract,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_abis_resolve() {
        let resolver = ContractResolver::new().unwrap();
        let d = resolver.resolve(ProtocolEnv::EigenDaHolesky, ContractOverrides::default());
        assert_eq!(d.network(), Network::Holesky);
        assert_eq!(
            d.service_manager(),
            "0xD4A7E1Bd8015057293f0D0A557088c286942e84b".parse::<Address>().unwrap()
        );
        assert!(d.confirm_batch().is_some());
    }

    #[test]
    fn confirm_batch_selector_matches_canonical_signature() {
        let resolver = ContractResolver::new().unwrap();
        let d = resolver.resolve(ProtocolEnv::EigenDaMainnet, ContractOverrides::default());
        let sig = "confirmBatch((bytes32,bytes,bytes,uint32),\
                   (uint32[],(uint256,uint256)[],(uint256,uint256)[],(uint256[2],uint256[2]),\
                   (uint256,uint256),uint32[],uint32[],uint32[][]))";
        let expected = alloy_primitives::keccak256(sig);
        assert_eq!(d.confirm_batch_selector().unwrap(), expected[..4]);
    }

    #[test]
    fn resolution_is_cached_per_env() {
        let resolver = ContractResolver::new().unwrap();
        let a = resolver.resolve(ProtocolEnv::EigenDaMainnet, ContractOverrides::default());
        let b = resolver.resolve(ProtocolEnv::EigenDaMainnet, ContractOverrides::default());
        assert!(Arc::ptr_eq(&a, &b));
        let c = resolver.resolve(ProtocolEnv::EigenDaHolesky, ContractOverrides::default());
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn overrides_replace_single_address() {
        let resolver = ContractResolver::new().unwrap();
        let custom = Address::repeat_byte(0x42);
        let d = resolver.resolve(
            ProtocolEnv::EigenDaHolesky,
            ContractOverrides {
                service_manager: None,
                bls_apk_registry: Some(custom),
            },
        );
        assert_eq!(d.bls_apk_registry(), custom);
        assert_eq!(
            d.service_manager(),
            ContractAddresses::for_env(ProtocolEnv::EigenDaHolesky).service_manager
        );
    }

    #[test]
    fn broken_abi_is_rejected() {
        let err = ContractResolver::from_abi_json("not json", BLS_APK_REGISTRY_ABI).err().unwrap();
        assert!(matches!(err, ResolveError::InvalidAbi { contract: "service manager", .. }));
    }
}
