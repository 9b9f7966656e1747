use thiserror::Error;

use agora_shared::TxHash;
use agora_wallet::ProviderError;

/// Errors from the contract client.
///
/// Validation variants are terminal for an attempt and never retried; only
/// provider-level transport failures are eligible for the retry policies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// No wallet provider was supplied to `initialize`.
    #[error("No wallet provider available")]
    NoProvider,

    /// No signer account is available.
    #[error("Wallet not connected")]
    NotConnected,

    /// The configured contract address is malformed.
    #[error("Invalid contract address: {0}")]
    InvalidAddress(String),

    /// The configured ABI is missing or not a non-empty array.
    #[error("Invalid contract ABI: {0}")]
    InvalidAbi(String),

    /// The liveness probe failed through both the wallet provider and the
    /// read-only fallback: the contract is unreachable or not deployed.
    #[error("Contract not reachable at the configured address")]
    NotDeployed,

    /// Transport/classification passthrough from the provider boundary.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Calldata encoding or return-data decoding failed.
    #[error("ABI encoding error: {0}")]
    Abi(String),

    /// The transaction was broadcast but not mined within the confirmation
    /// window. Unknown outcome: never resubmitted, to avoid duplication.
    #[error("Transaction {0} unconfirmed after timeout")]
    ConfirmationTimeout(TxHash),

    /// The transaction was mined but its receipt reports failure.
    #[error("Transaction {0} reverted on chain")]
    TxReverted(TxHash),
}

impl ChainError {
    /// Whether the retry policies may re-attempt after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(p) => p.is_retryable(),
            _ => false,
        }
    }

    /// A user-facing message: known revert reasons are mapped to friendlier
    /// wording, everything else falls back to the error's `Display`.
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(ProviderError::Revert(reason)) => revert_message(reason),
            Self::Provider(ProviderError::UserRejected) => {
                "Request rejected in the wallet".to_string()
            }
            Self::Provider(p) if p.is_retryable() => {
                "Network hiccup, please try again".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Map known contract revert reasons to user-facing messages.
///
/// Unmatched reasons pass through their raw text.
fn revert_message(reason: &str) -> String {
    match reason {
        "User already registered" => "This wallet already has a profile".to_string(),
        "User not registered" => "Create a profile first".to_string(),
        "Already a creator" => "This account is already a creator".to_string(),
        "Not a creator" => "Only creators can do this".to_string(),
        "Invalid content hash" => "The media reference is invalid".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_only_for_transport_kinds() {
        assert!(ChainError::Provider(ProviderError::Timeout).is_retryable());
        assert!(ChainError::Provider(ProviderError::Rpc("x".into())).is_retryable());
        assert!(!ChainError::Provider(ProviderError::UserRejected).is_retryable());
        assert!(!ChainError::NotDeployed.is_retryable());
        assert!(!ChainError::InvalidAbi("empty".into()).is_retryable());
    }

    #[test]
    fn known_reverts_get_friendly_messages() {
        let err = ChainError::Provider(ProviderError::Revert("Already a creator".into()));
        assert_eq!(err.user_message(), "This account is already a creator");
    }

    #[test]
    fn unknown_reverts_pass_through() {
        let err = ChainError::Provider(ProviderError::Revert("Price too low".into()));
        assert_eq!(err.user_message(), "Price too low");
    }
}
