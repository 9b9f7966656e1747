//! The session context: the single live view of the connection.
//!
//! One writer (methods on [`SessionContext`] reached through a
//! [`SessionHandle`]), many readers (immutable [`SessionSnapshot`]s stamped
//! with the generation). Every account or chain change bumps the generation;
//! results captured under an older generation are discarded, not applied.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use agora_chain::ContractClient;
use agora_shared::{Address, ChainId, ConnectionPhase, UserProfile};
use agora_store::Database;

/// The feature-operation kinds, used by the per-kind in-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    RegisterUser,
    UpdateProfile,
    BecomeCreator,
    CreatePost,
    CreateStory,
}

impl OpKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::RegisterUser => "register user",
            Self::UpdateProfile => "update profile",
            Self::BecomeCreator => "become creator",
            Self::CreatePost => "create post",
            Self::CreateStory => "create story",
        }
    }
}

/// Central session state.
pub struct SessionContext {
    /// Active wallet account. `None` until connected.
    account: Option<Address>,

    /// Chain the wallet currently reports.
    chain_id: Option<ChainId>,

    /// Wallet connection phase.
    phase: ConnectionPhase,

    /// Live contract handle. Dropped on every account/chain change.
    contract: Option<Arc<ContractClient>>,

    /// Handle to the local media store.
    /// `None` when the store could not be opened; media features degrade.
    store: Option<Database>,

    /// Last profile fetched from the contract. Never locally projected.
    profile: Option<UserProfile>,

    /// Last surfaced error message, for the UI to display.
    last_error: Option<String>,

    /// Whether a feature operation is currently running.
    loading: bool,

    /// Whether session bootstrap (connect + contract init) is running.
    initializing: bool,

    /// Bumped on every account/chain change; stale results are discarded.
    generation: u64,

    /// Operation kinds currently in flight (double-submit guard).
    in_flight: HashSet<OpKind>,
}

impl SessionContext {
    fn new(store: Option<Database>) -> Self {
        Self {
            account: None,
            chain_id: None,
            phase: ConnectionPhase::Disconnected,
            contract: None,
            store,
            profile: None,
            last_error: None,
            loading: false,
            initializing: false,
            generation: 0,
            in_flight: HashSet::new(),
        }
    }
}

/// Immutable view of the session at one point in time.
#[derive(Clone)]
pub struct SessionSnapshot {
    pub account: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub phase: ConnectionPhase,
    pub contract: Option<Arc<ContractClient>>,
    pub profile: Option<UserProfile>,
    pub last_error: Option<String>,
    pub loading: bool,
    pub initializing: bool,
    pub generation: u64,
}

/// Shared, cloneable handle to the session context.
///
/// Locking discipline: the inner mutex is never held across an await point;
/// operations take a snapshot, do their async work, and write back through
/// the generation-checked setters.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<SessionContext>>,
}

impl SessionHandle {
    pub fn new(store: Option<Database>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionContext::new(store))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionContext> {
        self.inner.lock().expect("session lock poisoned")
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let ctx = self.lock();
        SessionSnapshot {
            account: ctx.account,
            chain_id: ctx.chain_id,
            phase: ctx.phase,
            contract: ctx.contract.clone(),
            profile: ctx.profile.clone(),
            last_error: ctx.last_error.clone(),
            loading: ctx.loading,
            initializing: ctx.initializing,
            generation: ctx.generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Run a closure against the media store, if one is open.
    pub fn with_store<T>(&self, f: impl FnOnce(&Database) -> T) -> Option<T> {
        let ctx = self.lock();
        ctx.store.as_ref().map(f)
    }

    // -- writers (the only mutation paths) ---------------------------------

    pub fn set_connected(&self, account: Address, chain_id: ChainId, phase: ConnectionPhase) {
        let mut ctx = self.lock();
        ctx.account = Some(account);
        ctx.chain_id = Some(chain_id);
        ctx.phase = phase;
    }

    pub fn set_contract(&self, contract: Arc<ContractClient>) {
        self.lock().contract = Some(contract);
    }

    pub fn set_initializing(&self, value: bool) {
        self.lock().initializing = value;
    }

    pub fn set_last_error(&self, message: Option<String>) {
        self.lock().last_error = message;
    }

    /// Apply a freshly fetched profile, unless the session has moved on to a
    /// newer generation since the fetch started. Returns whether it applied.
    pub fn apply_profile(&self, profile: UserProfile, generation: u64) -> bool {
        let mut ctx = self.lock();
        if ctx.generation != generation {
            tracing::warn!(
                captured = generation,
                current = ctx.generation,
                "discarding stale profile"
            );
            return false;
        }
        ctx.profile = Some(profile);
        true
    }

    /// Account switch: keep the connection, drop everything derived from the
    /// previous account, bump the generation.
    pub fn switch_account(&self, account: Address) {
        let mut ctx = self.lock();
        ctx.account = Some(account);
        ctx.contract = None;
        ctx.profile = None;
        ctx.generation += 1;
    }

    /// Chain change: drop all derived state so it is rebuilt from scratch.
    pub fn chain_changed(&self, chain_id: ChainId, phase: ConnectionPhase) {
        let mut ctx = self.lock();
        ctx.chain_id = Some(chain_id);
        ctx.phase = phase;
        ctx.contract = None;
        ctx.profile = None;
        ctx.generation += 1;
    }

    /// Full disconnect: back to the blank state (the store stays open).
    pub fn clear_session(&self) {
        let mut ctx = self.lock();
        ctx.account = None;
        ctx.chain_id = None;
        ctx.phase = ConnectionPhase::Disconnected;
        ctx.contract = None;
        ctx.profile = None;
        ctx.last_error = None;
        ctx.generation += 1;
    }

    /// Try to mark an operation kind as in flight. `false` means the same
    /// kind is already running (double submit).
    pub fn begin_operation(&self, kind: OpKind) -> bool {
        let mut ctx = self.lock();
        if !ctx.in_flight.insert(kind) {
            return false;
        }
        ctx.loading = true;
        true
    }

    pub fn end_operation(&self, kind: OpKind) {
        let mut ctx = self.lock();
        ctx.in_flight.remove(&kind);
        ctx.loading = !ctx.in_flight.is_empty();
    }
}
