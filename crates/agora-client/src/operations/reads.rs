//! Read-side wrappers over the contract's view functions.
//!
//! Unlike the mutating operations these return `Result`: the caller decides
//! how to present a read failure, and nothing here changes state.

use agora_chain::{ChainError, ContractClient};
use agora_shared::{Address, UserProfile};
use std::sync::Arc;

use crate::context::SessionHandle;

fn live_contract(ctx: &SessionHandle) -> Result<(Arc<ContractClient>, Address), ChainError> {
    let snap = ctx.snapshot();
    let contract = snap.contract.ok_or(ChainError::NotConnected)?;
    let account = snap.account.ok_or(ChainError::NotConnected)?;
    Ok((contract, account))
}

/// Fetch any address's profile; `None` means the connected account.
pub async fn fetch_profile(
    ctx: &SessionHandle,
    address: Option<Address>,
) -> Result<UserProfile, ChainError> {
    let (contract, account) = live_contract(ctx)?;
    contract.get_user(address.unwrap_or(account)).await
}

/// Total number of posts ever created on the contract.
pub async fn content_count(ctx: &SessionHandle) -> Result<u128, ChainError> {
    let (contract, _) = live_contract(ctx)?;
    contract.content_counter().await
}

/// Total number of stories ever created on the contract.
pub async fn story_count(ctx: &SessionHandle) -> Result<u128, ChainError> {
    let (contract, _) = live_contract(ctx)?;
    contract.story_counter().await
}

/// Content ids owned by an address (`None` = connected account).
pub async fn user_contents(
    ctx: &SessionHandle,
    address: Option<Address>,
) -> Result<Vec<u128>, ChainError> {
    let (contract, account) = live_contract(ctx)?;
    contract.user_contents(address.unwrap_or(account)).await
}

/// Story ids owned by an address (`None` = connected account).
pub async fn user_stories(
    ctx: &SessionHandle,
    address: Option<Address>,
) -> Result<Vec<u128>, ChainError> {
    let (contract, account) = live_contract(ctx)?;
    contract.user_stories(address.unwrap_or(account)).await
}
