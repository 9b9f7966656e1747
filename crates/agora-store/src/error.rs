use thiserror::Error;

/// Errors produced by the store layer.
///
/// These never escalate into the contract-layer retry logic; callers treat
/// each variant as a distinct, non-fatal condition.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No record under the requested identifier (or the identifier is a
    /// reserved placeholder, which never resolves).
    #[error("Media record not found")]
    NotFound,

    /// Payload exceeds the per-record ceiling. Validation failure, not retried.
    #[error("Media too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    /// MIME type outside the accepted `image/*` / `video/*` set.
    #[error("Unsupported media type: {0}")]
    InvalidMediaType(String),

    /// The store is out of capacity. Distinct from [`StoreError::NotFound`].
    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// A stored record failed to deserialize.
    #[error("Corrupt media record: {0}")]
    Corrupt(String),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
