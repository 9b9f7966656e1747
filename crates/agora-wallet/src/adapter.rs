//! Wallet connection state machine.
//!
//! Phases: `Disconnected -> Connecting -> ConnectedReady` (or
//! `ConnectedWrongChain` when the chain-switch step fails). Provider events
//! re-evaluate the phase; the caller decides what a transition means for its
//! own derived state.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use agora_shared::constants::{
    PUBLIC_RPC_URL, TARGET_CHAIN_CURRENCY, TARGET_CHAIN_EXPLORER, TARGET_CHAIN_NAME,
};
use agora_shared::{Address, ChainId, ConnectionPhase};

use crate::error::{AdapterError, ProviderError};
use crate::provider::{parse_accounts, parse_chain_id, WalletProvider};
use crate::ProviderEvent;

/// Result of a successful [`WalletAdapter::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedSession {
    pub account: Address,
    pub chain_id: ChainId,
}

/// What a provider event means for state derived from the connection.
///
/// Any transition other than `None` invalidates contract handles built on the
/// previous account/chain; `Reinitialize` is the clean-slate rebuild the
/// original design expressed as a full page reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletTransition {
    /// Nothing derived needs to change.
    None,
    /// The wallet disconnected; drop everything.
    Disconnected,
    /// A different account is now active; rebuild with the new account.
    AccountChanged(Address),
    /// The chain changed; rebuild everything from scratch.
    Reinitialize(ChainId),
}

/// Wraps an (optional) injected provider with connection management.
pub struct WalletAdapter {
    provider: Option<Arc<dyn WalletProvider>>,
    target_chain: ChainId,
    phase: ConnectionPhase,
    account: Option<Address>,
    chain_id: Option<ChainId>,
}

impl WalletAdapter {
    /// `provider` is `None` when no wallet is injected into the environment.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, target_chain: ChainId) -> Self {
        Self {
            provider,
            target_chain,
            phase: ConnectionPhase::Disconnected,
            account: None,
            chain_id: None,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        self.chain_id
    }

    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.provider.clone()
    }

    /// Connect to the wallet and make sure it is on the target chain.
    ///
    /// Fails fast (no retry) when no provider is injected. When the active
    /// chain is wrong, an automatic switch is attempted; an unknown chain is
    /// registered first. Failures of either step are surfaced, not swallowed,
    /// and leave the adapter in `ConnectedWrongChain`.
    pub async fn connect(&mut self) -> Result<ConnectedSession, AdapterError> {
        let provider = self.provider.clone().ok_or(AdapterError::NoProvider)?;

        self.phase = ConnectionPhase::Connecting;

        let accounts_raw = match provider.request("eth_requestAccounts", json!([])).await {
            Ok(v) => v,
            Err(e) => {
                self.phase = ConnectionPhase::Disconnected;
                return Err(e.into());
            }
        };
        let accounts = parse_accounts(&accounts_raw)?;
        let account = *accounts.first().ok_or_else(|| {
            self.phase = ConnectionPhase::Disconnected;
            AdapterError::NoAccounts
        })?;

        let chain_raw = provider.request("eth_chainId", json!([])).await?;
        let mut chain_id = parse_chain_id(&chain_raw)?;

        if chain_id != self.target_chain {
            info!(
                current = %chain_id,
                target = %self.target_chain,
                "wrong chain, requesting switch"
            );
            match self.ensure_target_chain(provider.as_ref()).await {
                Ok(()) => chain_id = self.target_chain,
                Err(e) => {
                    warn!(error = %e, "chain switch failed");
                    self.phase = ConnectionPhase::ConnectedWrongChain;
                    self.account = Some(account);
                    self.chain_id = Some(chain_id);
                    return Err(e);
                }
            }
        }

        self.phase = ConnectionPhase::ConnectedReady;
        self.account = Some(account);
        self.chain_id = Some(chain_id);

        info!(account = %account.short(), chain = %chain_id, "wallet connected");

        Ok(ConnectedSession { account, chain_id })
    }

    /// Switch the wallet to the target chain, registering it first if the
    /// wallet does not know it (provider code 4902).
    async fn ensure_target_chain(
        &self,
        provider: &dyn WalletProvider,
    ) -> Result<(), AdapterError> {
        let switch_params = json!([{ "chainId": self.target_chain.to_hex() }]);

        match provider
            .request("wallet_switchEthereumChain", switch_params.clone())
            .await
        {
            Ok(_) => Ok(()),
            Err(ProviderError::ChainNotAdded) => {
                info!(chain = %self.target_chain, "registering chain with wallet");
                provider
                    .request("wallet_addEthereumChain", self.add_chain_params())
                    .await?;
                provider
                    .request("wallet_switchEthereumChain", switch_params)
                    .await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn add_chain_params(&self) -> Value {
        json!([{
            "chainId": self.target_chain.to_hex(),
            "chainName": TARGET_CHAIN_NAME,
            "nativeCurrency": {
                "name": TARGET_CHAIN_CURRENCY,
                "symbol": TARGET_CHAIN_CURRENCY,
                "decimals": 18,
            },
            "rpcUrls": [PUBLIC_RPC_URL],
            "blockExplorerUrls": [TARGET_CHAIN_EXPLORER],
        }])
    }

    /// Drop the connection and all derived fields.
    pub fn disconnect(&mut self) {
        self.phase = ConnectionPhase::Disconnected;
        self.account = None;
        self.chain_id = None;
    }

    /// Apply a provider event and report what it invalidates.
    pub fn handle_event(&mut self, event: ProviderEvent) -> WalletTransition {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    info!("wallet reported empty account list, disconnecting");
                    self.disconnect();
                    WalletTransition::Disconnected
                }
                Some(&account) if Some(account) != self.account => {
                    self.account = Some(account);
                    WalletTransition::AccountChanged(account)
                }
                Some(_) => WalletTransition::None,
            },
            ProviderEvent::ChainChanged(chain_id) => {
                self.chain_id = Some(chain_id);
                self.phase = if chain_id == self.target_chain {
                    ConnectionPhase::ConnectedReady
                } else {
                    ConnectionPhase::ConnectedWrongChain
                };
                WalletTransition::Reinitialize(chain_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    const ACCOUNT: &str = "0x00000000000000000000000000000000000000aa";

    /// Scripted provider: records every method call, answers from a fixed
    /// behavior table.
    struct ScriptedProvider {
        calls: Mutex<Vec<String>>,
        chain: Mutex<ChainId>,
        known_chains: Mutex<Vec<ChainId>>,
        reject_connect: bool,
    }

    impl ScriptedProvider {
        fn on_chain(chain: ChainId) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                chain: Mutex::new(chain),
                known_chains: Mutex::new(vec![chain]),
                reject_connect: false,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WalletProvider for ScriptedProvider {
        async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
            self.calls.lock().unwrap().push(method.to_string());
            match method {
                "eth_requestAccounts" => {
                    if self.reject_connect {
                        Err(ProviderError::UserRejected)
                    } else {
                        Ok(json!([ACCOUNT]))
                    }
                }
                "eth_chainId" => Ok(json!(self.chain.lock().unwrap().to_hex())),
                "wallet_switchEthereumChain" => {
                    let wanted = ChainId::from_hex(
                        params[0]["chainId"].as_str().unwrap(),
                    )
                    .unwrap();
                    if self.known_chains.lock().unwrap().contains(&wanted) {
                        *self.chain.lock().unwrap() = wanted;
                        Ok(Value::Null)
                    } else {
                        Err(ProviderError::ChainNotAdded)
                    }
                }
                "wallet_addEthereumChain" => {
                    let added = ChainId::from_hex(
                        params[0]["chainId"].as_str().unwrap(),
                    )
                    .unwrap();
                    self.known_chains.lock().unwrap().push(added);
                    Ok(Value::Null)
                }
                other => Err(ProviderError::UnsupportedMethod(other.to_string())),
            }
        }

        fn subscribe(&self) -> mpsc::Receiver<ProviderEvent> {
            let (_tx, rx) = mpsc::channel(1);
            rx
        }
    }

    #[tokio::test]
    async fn connect_on_target_chain() {
        let provider = Arc::new(ScriptedProvider::on_chain(ChainId(80002)));
        let mut adapter = WalletAdapter::new(Some(provider.clone()), ChainId(80002));

        let session = adapter.connect().await.unwrap();

        assert_eq!(session.account, Address::from_hex(ACCOUNT).unwrap());
        assert_eq!(adapter.phase(), ConnectionPhase::ConnectedReady);
        assert!(!provider
            .calls()
            .contains(&"wallet_switchEthereumChain".to_string()));
    }

    #[tokio::test]
    async fn connect_switches_known_chain() {
        let provider = Arc::new(ScriptedProvider::on_chain(ChainId(1)));
        provider.known_chains.lock().unwrap().push(ChainId(80002));
        let mut adapter = WalletAdapter::new(Some(provider.clone()), ChainId(80002));

        let session = adapter.connect().await.unwrap();

        assert_eq!(session.chain_id, ChainId(80002));
        assert!(provider
            .calls()
            .contains(&"wallet_switchEthereumChain".to_string()));
        assert!(!provider
            .calls()
            .contains(&"wallet_addEthereumChain".to_string()));
    }

    #[tokio::test]
    async fn connect_registers_unknown_chain_then_switches() {
        let provider = Arc::new(ScriptedProvider::on_chain(ChainId(1)));
        let mut adapter = WalletAdapter::new(Some(provider.clone()), ChainId(80002));

        let session = adapter.connect().await.unwrap();

        assert_eq!(session.chain_id, ChainId(80002));
        let calls = provider.calls();
        let add_pos = calls
            .iter()
            .position(|c| c == "wallet_addEthereumChain")
            .unwrap();
        let last_switch = calls
            .iter()
            .rposition(|c| c == "wallet_switchEthereumChain")
            .unwrap();
        assert!(add_pos < last_switch);
    }

    #[tokio::test]
    async fn connect_without_provider_fails_fast() {
        let mut adapter = WalletAdapter::new(None, ChainId(80002));
        assert!(matches!(
            adapter.connect().await,
            Err(AdapterError::NoProvider)
        ));
        assert_eq!(adapter.phase(), ConnectionPhase::Disconnected);
    }

    #[tokio::test]
    async fn connect_surfaces_user_rejection() {
        let provider = Arc::new(ScriptedProvider {
            reject_connect: true,
            ..ScriptedProvider::on_chain(ChainId(80002))
        });
        let mut adapter = WalletAdapter::new(Some(provider), ChainId(80002));

        assert!(matches!(
            adapter.connect().await,
            Err(AdapterError::Provider(ProviderError::UserRejected))
        ));
        assert_eq!(adapter.phase(), ConnectionPhase::Disconnected);
    }

    #[tokio::test]
    async fn empty_accounts_event_disconnects() {
        let provider = Arc::new(ScriptedProvider::on_chain(ChainId(80002)));
        let mut adapter = WalletAdapter::new(Some(provider), ChainId(80002));
        adapter.connect().await.unwrap();

        let transition = adapter.handle_event(ProviderEvent::AccountsChanged(vec![]));

        assert_eq!(transition, WalletTransition::Disconnected);
        assert_eq!(adapter.phase(), ConnectionPhase::Disconnected);
        assert!(adapter.account().is_none());
    }

    #[tokio::test]
    async fn chain_change_forces_reinitialize() {
        let provider = Arc::new(ScriptedProvider::on_chain(ChainId(80002)));
        let mut adapter = WalletAdapter::new(Some(provider), ChainId(80002));
        adapter.connect().await.unwrap();

        let transition = adapter.handle_event(ProviderEvent::ChainChanged(ChainId(1)));

        assert_eq!(transition, WalletTransition::Reinitialize(ChainId(1)));
        assert_eq!(adapter.phase(), ConnectionPhase::ConnectedWrongChain);
    }
}
