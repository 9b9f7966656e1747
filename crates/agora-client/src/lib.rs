//! # agora-client
//!
//! Session state and feature operations for the Agora client.
//!
//! The [`SessionContext`] is the single live view of account, contract
//! handle, and profile; feature operations borrow it through a
//! [`SessionHandle`], perform their store writes and contract calls, and
//! reconcile the result back. Wallet events flow through one reconciliation
//! task so stale call results can be discarded by generation.

pub mod config;
pub mod context;
pub mod manager;
pub mod operations;
pub mod reconcile;

pub use config::Config;
pub use context::{OpKind, SessionContext, SessionHandle, SessionSnapshot};
pub use manager::SessionManager;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber for an embedding binary.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("agora_client=debug,agora_chain=debug,agora_wallet=debug,agora_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
