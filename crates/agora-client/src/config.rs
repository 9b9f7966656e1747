//! Client configuration loaded from environment variables.
//!
//! All settings have compiled-in defaults so the client works with zero
//! configuration against the standard deployment.

use std::path::PathBuf;
use std::sync::Arc;

use agora_chain::{ContractConfig, RpcEndpoint};
use agora_shared::constants::{CONTRACT_ADDRESS, PUBLIC_RPC_URL, TARGET_CHAIN_ID};
use agora_shared::ChainId;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address of the content contract.
    /// Env: `AGORA_CONTRACT_ADDRESS`
    pub contract_address: String,

    /// Chain the contract is deployed on.
    /// Env: `AGORA_CHAIN_ID` (decimal)
    pub chain_id: ChainId,

    /// Public read-only RPC endpoint for the liveness-probe fallback.
    /// Env: `AGORA_RPC_URL`
    pub rpc_url: String,

    /// Override for the media store location.
    /// Env: `AGORA_DATA_DIR`
    /// Default: the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contract_address: CONTRACT_ADDRESS.to_string(),
            chain_id: ChainId(TARGET_CHAIN_ID),
            rpc_url: PUBLIC_RPC_URL.to_string(),
            data_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("AGORA_CONTRACT_ADDRESS") {
            config.contract_address = addr;
        }

        if let Ok(id) = std::env::var("AGORA_CHAIN_ID") {
            if let Ok(parsed) = id.parse::<u64>() {
                config.chain_id = ChainId(parsed);
            } else {
                tracing::warn!(value = %id, "Invalid AGORA_CHAIN_ID, using default");
            }
        }

        if let Ok(url) = std::env::var("AGORA_RPC_URL") {
            config.rpc_url = url;
        }

        if let Ok(dir) = std::env::var("AGORA_DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Contract-client configuration derived from these settings.
    pub fn contract_config(&self) -> ContractConfig {
        ContractConfig {
            contract_address: self.contract_address.clone(),
            chain_id: self.chain_id,
            abi_json: agora_chain::abi::CONTRACT_ABI_JSON.to_string(),
            fallback: Some(Arc::new(RpcEndpoint::new(self.rpc_url.clone()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_standard_deployment() {
        let config = Config::default();
        assert_eq!(config.chain_id, ChainId(TARGET_CHAIN_ID));
        assert_eq!(config.contract_address, CONTRACT_ADDRESS);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn contract_config_carries_fallback() {
        let config = Config::default();
        let contract = config.contract_config();
        assert!(contract.fallback.is_some());
        assert_eq!(contract.chain_id, config.chain_id);
    }
}
