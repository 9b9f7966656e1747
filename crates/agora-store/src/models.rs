use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agora_shared::MediaId;

/// A stored media payload plus its metadata.
///
/// Records are created on upload, read on display, and never updated.  The
/// payload is carried as a self-describing data URI so it can be handed to a
/// renderer without further lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: MediaId,
    /// `data:<mime>;base64,<payload>`; decodes back to the original bytes.
    pub data_uri: String,
    pub file_name: String,
    pub mime_type: String,
    /// Size of the decoded payload in bytes.
    pub byte_size: usize,
    pub created_at: DateTime<Utc>,
}

/// Aggregate store usage, used for quota accounting and diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub records: u64,
    pub total_bytes: u64,
}
