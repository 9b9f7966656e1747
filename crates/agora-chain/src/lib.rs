//! # agora-chain
//!
//! Typed client for the Agora content contract: ordered initialization
//! validation, a liveness probe with a read-only fallback, and call wrappers
//! that apply one retry policy with timeout races and a closed error
//! classification.

pub mod abi;
pub mod client;
pub mod error;
pub mod retry;
pub mod rpc;

pub use client::{ContractClient, ContractConfig};
pub use error::ChainError;
pub use retry::{Backoff, RetryPolicy};
pub use rpc::{ReadOnlyProbe, RpcEndpoint};
