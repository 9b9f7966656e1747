//! The injected-provider boundary.
//!
//! [`WalletProvider`] mirrors the request surface of a browser-injected
//! EIP-1193 provider. Implementations classify raw errors into
//! [`ProviderError`] kinds before returning; nothing above this boundary
//! inspects error message strings.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use agora_shared::{Address, ChainId};

use crate::error::ProviderError;

/// Asynchronous notifications pushed by the wallet.
///
/// Delivered over an mpsc channel so the application consumes them from a
/// single reconciliation task rather than re-entrant callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The active account set changed. An empty list means the wallet
    /// disconnected from this site.
    AccountsChanged(Vec<Address>),
    /// The wallet switched chains.
    ChainChanged(ChainId),
}

/// A wallet provider: the single gateway for both wallet-management methods
/// (`eth_requestAccounts`, `wallet_switchEthereumChain`, ...) and chain RPC
/// (`eth_call`, `eth_sendTransaction`, ...).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Perform one provider request.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Subscribe to wallet events. Each call returns an independent receiver.
    fn subscribe(&self) -> mpsc::Receiver<ProviderEvent>;
}

/// Decode the JSON array of account strings returned by
/// `eth_requestAccounts` / `eth_accounts`.
pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, ProviderError> {
    let list = value
        .as_array()
        .ok_or_else(|| ProviderError::Rpc("accounts response is not an array".to_string()))?;

    list.iter()
        .map(|v| {
            let s = v
                .as_str()
                .ok_or_else(|| ProviderError::Rpc("account entry is not a string".to_string()))?;
            Address::from_hex(s).map_err(|e| ProviderError::Rpc(format!("bad account {s}: {e}")))
        })
        .collect()
}

/// Decode the hex chain id returned by `eth_chainId`.
pub fn parse_chain_id(value: &Value) -> Result<ChainId, ProviderError> {
    let s = value
        .as_str()
        .ok_or_else(|| ProviderError::Rpc("chainId response is not a string".to_string()))?;
    ChainId::from_hex(s).map_err(|e| ProviderError::Rpc(format!("bad chain id {s}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_account_list() {
        let value = json!(["0x4b1f7c38e42ba1d9c3f05a8d2e69700c5b7f9e21"]);
        let accounts = parse_accounts(&value).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(
            accounts[0].to_hex(),
            "0x4b1f7c38e42ba1d9c3f05a8d2e69700c5b7f9e21"
        );
    }

    #[test]
    fn rejects_malformed_accounts() {
        assert!(parse_accounts(&json!("not-an-array")).is_err());
        assert!(parse_accounts(&json!(["0x123"])).is_err());
    }

    #[test]
    fn parses_chain_id() {
        assert_eq!(parse_chain_id(&json!("0x13882")).unwrap(), ChainId(80002));
    }
}
