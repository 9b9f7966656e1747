use thiserror::Error;

/// Closed classification of errors surfaced by a wallet provider.
///
/// The kind is decided exactly once, where the raw provider error is first
/// observed ([`ProviderError::from_rpc`]); downstream code matches on the
/// variant and never re-inspects message strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The user dismissed or denied the wallet prompt (EIP-1193 code 4001).
    /// Never retried.
    #[error("Rejected by user")]
    UserRejected,

    /// The requested method is not supported by this provider (code 4200).
    #[error("Method not supported: {0}")]
    UnsupportedMethod(String),

    /// The provider is not connected to any chain (codes 4900/4901).
    #[error("Provider disconnected")]
    Disconnected,

    /// The wallet does not know the requested chain (code 4902 from
    /// `wallet_switchEthereumChain`); the chain must be registered first.
    #[error("Chain not added to wallet")]
    ChainNotAdded,

    /// The contract reverted; carries the revert reason if one was decoded.
    #[error("Execution reverted: {0}")]
    Revert(String),

    /// The request did not complete in time.
    #[error("Request timed out")]
    Timeout,

    /// Any other RPC-level failure (unreachable node, decode failure, ...).
    #[error("RPC error: {0}")]
    Rpc(String),
}

impl ProviderError {
    /// Classify a raw JSON-RPC / EIP-1193 error at the boundary.
    pub fn from_rpc(code: i64, message: &str) -> Self {
        match code {
            4001 => Self::UserRejected,
            4200 => Self::UnsupportedMethod(message.to_string()),
            4900 | 4901 => Self::Disconnected,
            4902 => Self::ChainNotAdded,
            // Standard revert code, plus providers that only set the message.
            3 => Self::Revert(strip_revert_prefix(message)),
            _ if message.contains("execution reverted") => {
                Self::Revert(strip_revert_prefix(message))
            }
            _ => Self::Rpc(message.to_string()),
        }
    }

    /// Whether the contract layer may retry a call that failed this way.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Rpc(_) | Self::Disconnected)
    }
}

fn strip_revert_prefix(message: &str) -> String {
    message
        .split("execution reverted:")
        .nth(1)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| message.to_string())
}

/// Errors from the wallet adapter itself.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// No provider is injected into the environment. Fail fast, no retry.
    #[error("No wallet provider available")]
    NoProvider,

    /// The provider returned an empty account list.
    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_eip1193_codes() {
        assert_eq!(ProviderError::from_rpc(4001, "denied"), ProviderError::UserRejected);
        assert_eq!(ProviderError::from_rpc(4902, ""), ProviderError::ChainNotAdded);
        assert!(matches!(
            ProviderError::from_rpc(-32000, "header not found"),
            ProviderError::Rpc(_)
        ));
    }

    #[test]
    fn extracts_revert_reason() {
        let err = ProviderError::from_rpc(3, "execution reverted: Already a creator");
        assert_eq!(err, ProviderError::Revert("Already a creator".to_string()));
    }

    #[test]
    fn revert_detected_from_message_alone() {
        let err = ProviderError::from_rpc(-32603, "execution reverted: User not registered");
        assert_eq!(err, ProviderError::Revert("User not registered".to_string()));
    }

    #[test]
    fn retryable_kinds() {
        assert!(ProviderError::Timeout.is_retryable());
        assert!(ProviderError::Rpc("boom".into()).is_retryable());
        assert!(!ProviderError::UserRejected.is_retryable());
        assert!(!ProviderError::Revert("nope".into()).is_retryable());
    }
}
