//! Feature operations.
//!
//! Every operation is the same fixed sequence: precondition checks against a
//! session snapshot (no network touched on failure), optional media upload,
//! one mutating contract call, reconciliation, structured outcome. Nothing
//! here returns a raw error to the caller.

mod content;
mod profile;
mod reads;

pub use content::{create_post, create_story};
pub use profile::{become_creator, register_user, update_profile};
pub use reads::{content_count, fetch_profile, story_count, user_contents, user_stories};

use std::sync::Arc;

use agora_chain::ContractClient;
use agora_shared::{Address, ConnectionPhase, MediaId, OperationOutcome, UserProfile};

use crate::context::{OpKind, SessionHandle};

// Precondition / failure messages: a stable contract the UI matches on.
pub const MSG_NOT_CONNECTED: &str = "Wallet not connected";
pub const MSG_WRONG_CHAIN: &str = "Wrong network selected";
pub const MSG_CONTRACT_NOT_READY: &str = "Contract not initialized";
pub const MSG_STORE_UNAVAILABLE: &str = "Local media store unavailable";
pub const MSG_ALREADY_REGISTERED: &str = "This wallet already has a profile";
pub const MSG_NOT_REGISTERED: &str = "Create a profile first";
pub const MSG_ALREADY_CREATOR: &str = "This account is already a creator";
pub const MSG_NOT_CREATOR: &str = "Only creators can publish paid content";
pub const MSG_EMPTY_USERNAME: &str = "Username must not be empty";
pub const MSG_WALLET_CHANGED: &str = "Wallet changed during the operation, please retry";
pub const MSG_UNCONFIRMED: &str = "Submitted, confirmation pending; refresh shortly";
pub const MSG_TX_PENDING: &str = "Transaction sent but not yet confirmed; check back later";

/// A media payload handed in by the UI layer.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

/// Everything an operation needs once preconditions hold.
pub(crate) struct Ready {
    pub contract: Arc<ContractClient>,
    pub account: Address,
    pub profile: Option<UserProfile>,
    pub generation: u64,
}

/// Check the session-level preconditions shared by every operation.
pub(crate) fn ready_session(ctx: &SessionHandle) -> Result<Ready, OperationOutcome> {
    let snap = ctx.snapshot();

    match snap.phase {
        ConnectionPhase::Disconnected | ConnectionPhase::Connecting => {
            return Err(fail(ctx, MSG_NOT_CONNECTED))
        }
        ConnectionPhase::ConnectedWrongChain => return Err(fail(ctx, MSG_WRONG_CHAIN)),
        ConnectionPhase::ConnectedReady => {}
    }

    let account = match snap.account {
        Some(account) => account,
        None => return Err(fail(ctx, MSG_NOT_CONNECTED)),
    };
    let contract = match snap.contract {
        Some(contract) => contract,
        None => return Err(fail(ctx, MSG_CONTRACT_NOT_READY)),
    };

    Ok(Ready {
        contract,
        account,
        profile: snap.profile,
        generation: snap.generation,
    })
}

/// Record a failure on the session and build the outcome.
pub(crate) fn fail(ctx: &SessionHandle, message: impl Into<String>) -> OperationOutcome {
    let message = message.into();
    ctx.set_last_error(Some(message.clone()));
    OperationOutcome::failure(message)
}

/// Convert a contract-call error into an outcome.
///
/// A confirmation timeout after broadcast is an unknown outcome, not a
/// failure: the transaction may still be mined, and it was never resubmitted.
pub(crate) fn chain_failure(ctx: &SessionHandle, error: agora_chain::ChainError) -> OperationOutcome {
    match error {
        agora_chain::ChainError::ConfirmationTimeout(tx_hash) => {
            OperationOutcome::unconfirmed(MSG_TX_PENDING).with_tx(tx_hash)
        }
        other => fail(ctx, other.user_message()),
    }
}

/// Store a media payload, mapping every store failure to a structured
/// outcome. Store failures never reach the contract layer.
pub(crate) fn upload_media(
    ctx: &SessionHandle,
    upload: &MediaUpload,
) -> Result<MediaId, OperationOutcome> {
    match ctx.with_store(|db| db.put_media(&upload.bytes, &upload.mime_type, &upload.file_name)) {
        None => Err(fail(ctx, MSG_STORE_UNAVAILABLE)),
        Some(Ok(record)) => Ok(record.id),
        Some(Err(e)) => Err(fail(ctx, format!("Media upload failed: {e}"))),
    }
}

/// RAII double-submit guard: holds the operation kind in flight for the
/// duration of the operation.
pub(crate) struct OpGuard {
    ctx: SessionHandle,
    kind: OpKind,
}

impl OpGuard {
    pub(crate) fn acquire(ctx: &SessionHandle, kind: OpKind) -> Result<Self, OperationOutcome> {
        if !ctx.begin_operation(kind) {
            return Err(OperationOutcome::failure(format!(
                "A {} operation is already in progress",
                kind.label()
            )));
        }
        Ok(Self {
            ctx: ctx.clone(),
            kind,
        })
    }
}

impl Drop for OpGuard {
    fn drop(&mut self) {
        self.ctx.end_operation(self.kind);
    }
}
