//! Session lifecycle: connect, contract (re)initialization, and the wallet
//! event loop.
//!
//! Wallet events are consumed by one spawned task and funnelled into the
//! session context, so every mutation of derived state happens in a single
//! place and in a single order.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use agora_chain::ContractClient;
use agora_shared::{Address, ConnectionPhase, OperationOutcome};
use agora_store::Database;
use agora_wallet::{AdapterError, ProviderEvent, WalletAdapter, WalletProvider, WalletTransition};

use crate::config::Config;
use crate::context::SessionHandle;

/// Owns the wallet adapter and drives the session context.
pub struct SessionManager {
    ctx: SessionHandle,
    provider: Option<Arc<dyn WalletProvider>>,
    adapter: tokio::sync::Mutex<WalletAdapter>,
    config: Config,
    event_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        store: Option<Database>,
        config: Config,
    ) -> Arc<Self> {
        let adapter = WalletAdapter::new(provider.clone(), config.chain_id);
        Arc::new(Self {
            ctx: SessionHandle::new(store),
            provider,
            adapter: tokio::sync::Mutex::new(adapter),
            config,
            event_task: Mutex::new(None),
        })
    }

    /// The context feature operations borrow.
    pub fn context(&self) -> &SessionHandle {
        &self.ctx
    }

    /// Connect the wallet, initialize the contract handle, fetch the initial
    /// profile, and start consuming wallet events.
    pub async fn connect(self: &Arc<Self>) -> OperationOutcome {
        self.ctx.set_initializing(true);
        let outcome = self.connect_inner().await;
        self.ctx.set_initializing(false);

        if !outcome.success {
            self.ctx.set_last_error(Some(outcome.message.clone()));
        }
        outcome
    }

    async fn connect_inner(self: &Arc<Self>) -> OperationOutcome {
        let session = match self.adapter.lock().await.connect().await {
            Ok(session) => session,
            Err(AdapterError::NoProvider) => {
                return OperationOutcome::failure("No wallet provider available")
            }
            Err(e) => return OperationOutcome::failure(e.to_string()),
        };

        self.ctx.set_connected(
            session.account,
            session.chain_id,
            ConnectionPhase::ConnectedReady,
        );

        if let Err(outcome) = self.build_contract(session.account).await {
            return outcome;
        }

        self.spawn_event_loop();

        info!(account = %session.account.short(), "session ready");
        OperationOutcome::ok("Wallet connected")
    }

    /// Initialize a fresh contract handle for `account` and fetch its profile.
    async fn build_contract(&self, account: Address) -> Result<(), OperationOutcome> {
        let generation = self.ctx.generation();

        let contract = ContractClient::initialize(
            self.provider.clone(),
            Some(account),
            &self.config.contract_config(),
        )
        .await
        .map_err(|e| {
            error!(error = %e, "contract initialization failed");
            OperationOutcome::failure(e.user_message())
        })?;

        let contract = Arc::new(contract);
        self.ctx.set_contract(contract.clone());

        match contract.get_user(account).await {
            Ok(profile) => {
                self.ctx.apply_profile(profile, generation);
            }
            Err(e) => {
                // Not fatal: operations re-check preconditions themselves.
                warn!(error = %e, "initial profile fetch failed");
            }
        }
        Ok(())
    }

    /// Disconnect and clear every derived field.
    pub async fn disconnect(&self) {
        if let Some(task) = self.event_task.lock().expect("event task lock").take() {
            task.abort();
        }
        self.adapter.lock().await.disconnect();
        self.ctx.clear_session();
    }

    /// Apply one wallet event to the adapter and the session.
    pub async fn handle_wallet_event(self: &Arc<Self>, event: ProviderEvent) {
        let (transition, phase) = {
            let mut adapter = self.adapter.lock().await;
            let transition = adapter.handle_event(event);
            (transition, adapter.phase())
        };

        match transition {
            WalletTransition::None => {}
            WalletTransition::Disconnected => {
                self.ctx.clear_session();
            }
            WalletTransition::AccountChanged(account) => {
                info!(account = %account.short(), "account switched, rebuilding session");
                self.ctx.switch_account(account);
                if let Err(outcome) = self.build_contract(account).await {
                    self.ctx.set_last_error(Some(outcome.message));
                }
            }
            WalletTransition::Reinitialize(chain_id) => {
                info!(chain = %chain_id, "chain changed, rebuilding from scratch");
                self.ctx.chain_changed(chain_id, phase);
                if phase == ConnectionPhase::ConnectedReady {
                    if let Some(account) = self.ctx.snapshot().account {
                        if let Err(outcome) = self.build_contract(account).await {
                            self.ctx.set_last_error(Some(outcome.message));
                        }
                    }
                }
            }
        }
    }

    fn spawn_event_loop(self: &Arc<Self>) {
        let Some(provider) = self.provider.clone() else {
            return;
        };

        let mut slot = self.event_task.lock().expect("event task lock");
        if slot.is_some() {
            return;
        }

        let mut rx = provider.subscribe();
        let manager = Arc::clone(self);
        *slot = Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                manager.handle_wallet_event(event).await;
            }
        }));
    }
}
