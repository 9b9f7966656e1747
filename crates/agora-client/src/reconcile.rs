//! Post-mutation profile reconciliation.
//!
//! Chain read-after-write consistency is not guaranteed, so after a mutating
//! call succeeds the profile is re-fetched until the expected field change is
//! visible. Exhaustion is its own outcome: the transaction went through, the
//! new state just was not observed yet.

use agora_chain::{Backoff, ContractClient};
use agora_shared::constants::RECONCILE_MAX_ATTEMPTS;
use agora_shared::{Address, UserProfile};
use std::time::Duration;
use tracing::{debug, warn};

use crate::context::SessionHandle;

/// How a reconciliation pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileStatus {
    /// The expected change was observed and the profile applied.
    Confirmed(UserProfile),
    /// Attempts exhausted without observing the change. The best profile
    /// fetched (if any) has been applied; present as "likely fine, refresh".
    Unconfirmed,
    /// The session moved to a new generation mid-flight; nothing applied.
    Stale,
}

/// Re-fetch the profile until `expect` holds, with linear backoff before
/// each attempt (2 s / 4 s / 6 s).
pub async fn profile_after_mutation<F>(
    ctx: &SessionHandle,
    contract: &ContractClient,
    account: Address,
    generation: u64,
    expect: F,
) -> ReconcileStatus
where
    F: Fn(&UserProfile) -> bool,
{
    let backoff = Backoff::Linear {
        step: Duration::from_secs(2),
    };

    let mut latest: Option<UserProfile> = None;

    for attempt in 1..=RECONCILE_MAX_ATTEMPTS {
        tokio::time::sleep(backoff.delay_after(attempt)).await;

        if ctx.generation() != generation {
            return ReconcileStatus::Stale;
        }

        match contract.get_user(account).await {
            Ok(profile) => {
                let confirmed = expect(&profile);
                debug!(attempt, confirmed, "reconciliation fetch");
                latest = Some(profile.clone());
                if confirmed {
                    if !ctx.apply_profile(profile.clone(), generation) {
                        return ReconcileStatus::Stale;
                    }
                    return ReconcileStatus::Confirmed(profile);
                }
            }
            Err(e) => {
                warn!(attempt, error = %e, "reconciliation fetch failed");
            }
        }
    }

    // Keep whatever we did manage to observe rather than stale local state.
    if let Some(profile) = latest {
        if !ctx.apply_profile(profile, generation) {
            return ReconcileStatus::Stale;
        }
    }
    ReconcileStatus::Unconfirmed
}
