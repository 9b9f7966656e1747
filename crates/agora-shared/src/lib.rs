// Shared types and constants used by every Agora crate.

pub mod constants;
pub mod error;
pub mod types;

pub use error::ParseError;
pub use types::{
    Address, ChainId, ConnectionPhase, MediaId, OperationOutcome, TxHash, UserProfile,
};
