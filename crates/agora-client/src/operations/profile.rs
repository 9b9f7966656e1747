//! Profile operations: register, update, become creator.

use agora_shared::{MediaId, OperationOutcome};
use tracing::info;

use crate::context::{OpKind, SessionHandle};
use crate::reconcile::{self, ReconcileStatus};

use super::{
    chain_failure, fail, ready_session, upload_media, MediaUpload, OpGuard, MSG_ALREADY_CREATOR,
    MSG_ALREADY_REGISTERED, MSG_EMPTY_USERNAME, MSG_NOT_REGISTERED, MSG_UNCONFIRMED,
    MSG_WALLET_CHANGED,
};

/// Create the on-chain profile for the connected wallet.
pub async fn register_user(
    ctx: &SessionHandle,
    username: &str,
    bio: &str,
    avatar: Option<MediaUpload>,
) -> OperationOutcome {
    let _guard = match OpGuard::acquire(ctx, OpKind::RegisterUser) {
        Ok(guard) => guard,
        Err(outcome) => return outcome,
    };
    let ready = match ready_session(ctx) {
        Ok(ready) => ready,
        Err(outcome) => return outcome,
    };

    if username.trim().is_empty() {
        return fail(ctx, MSG_EMPTY_USERNAME);
    }
    if ready.profile.as_ref().is_some_and(|p| p.exists) {
        return fail(ctx, MSG_ALREADY_REGISTERED);
    }

    let avatar_id = match avatar {
        Some(upload) => match upload_media(ctx, &upload) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        },
        None => MediaId::default_avatar(),
    };

    let tx_hash = match ready.contract.register_user(username, &avatar_id, bio).await {
        Ok(tx) => tx,
        Err(e) => return chain_failure(ctx, e),
    };

    if ctx.generation() != ready.generation {
        return fail(ctx, MSG_WALLET_CHANGED);
    }

    info!(username, tx = %tx_hash, "profile registered, reconciling");

    match reconcile::profile_after_mutation(
        ctx,
        &ready.contract,
        ready.account,
        ready.generation,
        |p| p.exists,
    )
    .await
    {
        ReconcileStatus::Confirmed(_) => OperationOutcome::ok("Profile created")
            .with_media(avatar_id)
            .with_tx(tx_hash),
        ReconcileStatus::Unconfirmed => OperationOutcome::unconfirmed(MSG_UNCONFIRMED)
            .with_media(avatar_id)
            .with_tx(tx_hash),
        ReconcileStatus::Stale => fail(ctx, MSG_WALLET_CHANGED),
    }
}

/// Update username, bio, and optionally the avatar.
pub async fn update_profile(
    ctx: &SessionHandle,
    username: &str,
    bio: &str,
    avatar: Option<MediaUpload>,
) -> OperationOutcome {
    let _guard = match OpGuard::acquire(ctx, OpKind::UpdateProfile) {
        Ok(guard) => guard,
        Err(outcome) => return outcome,
    };
    let ready = match ready_session(ctx) {
        Ok(ready) => ready,
        Err(outcome) => return outcome,
    };

    if username.trim().is_empty() {
        return fail(ctx, MSG_EMPTY_USERNAME);
    }
    let current = match &ready.profile {
        Some(profile) if profile.exists => profile,
        _ => return fail(ctx, MSG_NOT_REGISTERED),
    };

    // Keep the existing avatar when no new upload is supplied.
    let avatar_id = match avatar {
        Some(upload) => match upload_media(ctx, &upload) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        },
        None => current.avatar.clone(),
    };

    let tx_hash = match ready.contract.update_profile(username, &avatar_id, bio).await {
        Ok(tx) => tx,
        Err(e) => return chain_failure(ctx, e),
    };

    if ctx.generation() != ready.generation {
        return fail(ctx, MSG_WALLET_CHANGED);
    }

    let expected_username = username.to_string();
    let expected_bio = bio.to_string();
    match reconcile::profile_after_mutation(
        ctx,
        &ready.contract,
        ready.account,
        ready.generation,
        move |p| p.username == expected_username && p.bio == expected_bio,
    )
    .await
    {
        ReconcileStatus::Confirmed(_) => OperationOutcome::ok("Profile updated")
            .with_media(avatar_id)
            .with_tx(tx_hash),
        ReconcileStatus::Unconfirmed => OperationOutcome::unconfirmed(MSG_UNCONFIRMED)
            .with_media(avatar_id)
            .with_tx(tx_hash),
        ReconcileStatus::Stale => fail(ctx, MSG_WALLET_CHANGED),
    }
}

/// Upgrade the registered profile to a creator account.
///
/// The creator flag is only ever set from a verified re-fetch, never
/// optimistically; an exhausted reconciliation reports the distinct
/// unconfirmed outcome instead of claiming success.
pub async fn become_creator(ctx: &SessionHandle) -> OperationOutcome {
    let _guard = match OpGuard::acquire(ctx, OpKind::BecomeCreator) {
        Ok(guard) => guard,
        Err(outcome) => return outcome,
    };
    let ready = match ready_session(ctx) {
        Ok(ready) => ready,
        Err(outcome) => return outcome,
    };

    match &ready.profile {
        None => return fail(ctx, MSG_NOT_REGISTERED),
        Some(profile) if !profile.exists => return fail(ctx, MSG_NOT_REGISTERED),
        Some(profile) if profile.is_creator => return fail(ctx, MSG_ALREADY_CREATOR),
        Some(_) => {}
    }

    // The contract call estimates gas first, so an on-chain revert surfaces
    // before any wallet prompt.
    let tx_hash = match ready.contract.become_creator().await {
        Ok(tx) => tx,
        Err(e) => return chain_failure(ctx, e),
    };

    if ctx.generation() != ready.generation {
        return fail(ctx, MSG_WALLET_CHANGED);
    }

    info!(tx = %tx_hash, "creator upgrade submitted, reconciling");

    match reconcile::profile_after_mutation(
        ctx,
        &ready.contract,
        ready.account,
        ready.generation,
        |p| p.is_creator,
    )
    .await
    {
        ReconcileStatus::Confirmed(_) => {
            OperationOutcome::ok("You are now a creator").with_tx(tx_hash)
        }
        ReconcileStatus::Unconfirmed => {
            OperationOutcome::unconfirmed(MSG_UNCONFIRMED).with_tx(tx_hash)
        }
        ReconcileStatus::Stale => fail(ctx, MSG_WALLET_CHANGED),
    }
}
