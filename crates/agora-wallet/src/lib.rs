// Wallet adapter layer over an injected EIP-1193-style provider.

pub mod adapter;
pub mod error;
pub mod provider;

pub use adapter::{ConnectedSession, WalletAdapter, WalletTransition};
pub use error::{AdapterError, ProviderError};
pub use provider::{ProviderEvent, WalletProvider};
