use thiserror::Error;

/// Errors from parsing the hex-encoded wire representations in [`crate::types`].
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Expected {expected} hex characters, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Invalid numeric value: {0}")]
    InvalidNumber(String),
}
