//! Content operations: posts and stories.

use agora_shared::OperationOutcome;
use tracing::info;

use crate::context::{OpKind, SessionHandle};
use crate::reconcile::{self, ReconcileStatus};

use super::{
    chain_failure, fail, ready_session, upload_media, MediaUpload, OpGuard, MSG_NOT_CREATOR,
    MSG_NOT_REGISTERED, MSG_UNCONFIRMED, MSG_WALLET_CHANGED,
};

/// Publish a post: upload the media locally, then anchor its reference
/// on chain with the price and paid flag.
pub async fn create_post(
    ctx: &SessionHandle,
    media: MediaUpload,
    price: u128,
    is_paid: bool,
) -> OperationOutcome {
    let _guard = match OpGuard::acquire(ctx, OpKind::CreatePost) {
        Ok(guard) => guard,
        Err(outcome) => return outcome,
    };
    let ready = match ready_session(ctx) {
        Ok(ready) => ready,
        Err(outcome) => return outcome,
    };

    let profile = match &ready.profile {
        Some(profile) if profile.exists => profile,
        _ => return fail(ctx, MSG_NOT_REGISTERED),
    };
    if is_paid && !profile.is_creator {
        return fail(ctx, MSG_NOT_CREATOR);
    }

    let media_id = match upload_media(ctx, &media) {
        Ok(id) => id,
        Err(outcome) => return outcome,
    };

    let tx_hash = match ready.contract.create_content(&media_id, price, is_paid).await {
        Ok(tx) => tx,
        Err(e) => return chain_failure(ctx, e),
    };

    if ctx.generation() != ready.generation {
        return fail(ctx, MSG_WALLET_CHANGED);
    }

    info!(media = %media_id, is_paid, "post created, refreshing profile");

    // Posts do not change a profile field we can wait on; the re-fetch is a
    // plain refresh so the session never serves a locally-computed view.
    match reconcile::profile_after_mutation(
        ctx,
        &ready.contract,
        ready.account,
        ready.generation,
        |_| true,
    )
    .await
    {
        ReconcileStatus::Confirmed(_) => OperationOutcome::ok("Post published")
            .with_media(media_id)
            .with_tx(tx_hash),
        ReconcileStatus::Unconfirmed => OperationOutcome::unconfirmed(MSG_UNCONFIRMED)
            .with_media(media_id)
            .with_tx(tx_hash),
        ReconcileStatus::Stale => fail(ctx, MSG_WALLET_CHANGED),
    }
}

/// Publish an ephemeral story anchored to an uploaded media reference.
pub async fn create_story(ctx: &SessionHandle, media: MediaUpload) -> OperationOutcome {
    let _guard = match OpGuard::acquire(ctx, OpKind::CreateStory) {
        Ok(guard) => guard,
        Err(outcome) => return outcome,
    };
    let ready = match ready_session(ctx) {
        Ok(ready) => ready,
        Err(outcome) => return outcome,
    };

    if !ready.profile.as_ref().is_some_and(|p| p.exists) {
        return fail(ctx, MSG_NOT_REGISTERED);
    }

    let media_id = match upload_media(ctx, &media) {
        Ok(id) => id,
        Err(outcome) => return outcome,
    };

    let tx_hash = match ready.contract.create_story(&media_id).await {
        Ok(tx) => tx,
        Err(e) => return chain_failure(ctx, e),
    };

    if ctx.generation() != ready.generation {
        return fail(ctx, MSG_WALLET_CHANGED);
    }

    match reconcile::profile_after_mutation(
        ctx,
        &ready.contract,
        ready.account,
        ready.generation,
        |_| true,
    )
    .await
    {
        ReconcileStatus::Confirmed(_) => OperationOutcome::ok("Story published")
            .with_media(media_id)
            .with_tx(tx_hash),
        ReconcileStatus::Unconfirmed => OperationOutcome::unconfirmed(MSG_UNCONFIRMED)
            .with_media(media_id)
            .with_tx(tx_hash),
        ReconcileStatus::Stale => fail(ctx, MSG_WALLET_CHANGED),
    }
}
