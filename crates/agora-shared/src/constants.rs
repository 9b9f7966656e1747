/// Chain id of the network the content contract is deployed on (Polygon Amoy).
pub const TARGET_CHAIN_ID: u64 = 80002;

/// Human-readable name of the target chain, used when registering it with a wallet.
pub const TARGET_CHAIN_NAME: &str = "Polygon Amoy";

/// Native currency symbol of the target chain.
pub const TARGET_CHAIN_CURRENCY: &str = "POL";

/// Public read-only JSON-RPC endpoint for the target chain.
///
/// Used only by the liveness-probe fallback, never for transactions.
pub const PUBLIC_RPC_URL: &str = "https://rpc-amoy.polygon.technology";

/// Block explorer for the target chain.
pub const TARGET_CHAIN_EXPLORER: &str = "https://amoy.polygonscan.com";

/// Address of the deployed content contract.
pub const CONTRACT_ADDRESS: &str = "0x4b1f7c38e42ba1d9c3f05a8d2e69700c5b7f9e21";

/// Maximum accepted media payload size in bytes (10 MiB).
pub const MAX_MEDIA_BYTES: usize = 10 * 1024 * 1024;

/// Prefix of generated media identifiers.
pub const MEDIA_ID_PREFIX: &str = "media";

/// Reserved identifier meaning "no real avatar". Never resolves to stored media.
pub const DEFAULT_AVATAR_ID: &str = "default_avatar";

/// Identifiers starting with this prefix are placeholders and never resolve.
pub const PLACEHOLDER_PREFIX: &str = "placeholder_";

/// Fraction of stored records evicted by a cleanup pass.
pub const CLEANUP_FRACTION: f64 = 0.3;

/// Timeout for a single read/mutating contract call (seconds).
pub const CALL_TIMEOUT_SECS: u64 = 15;

/// Timeout for one liveness-probe attempt during initialization (seconds).
pub const PROBE_TIMEOUT_SECS: u64 = 10;

/// How long to wait for an accepted transaction to be mined (seconds).
pub const CONFIRMATION_TIMEOUT_SECS: u64 = 60;

/// Spacing between transaction-receipt polls (seconds).
pub const RECEIPT_POLL_SECS: u64 = 2;

/// Attempts for a single contract call (initial + retries).
pub const CALL_MAX_ATTEMPTS: u32 = 2;

/// Attempts for the whole initialization sequence.
pub const INIT_MAX_ATTEMPTS: u32 = 3;

/// Internal attempts of the liveness probe within one initialization attempt.
pub const PROBE_MAX_ATTEMPTS: u32 = 3;

/// Attempts for the post-mutation profile re-fetch.
pub const RECONCILE_MAX_ATTEMPTS: u32 = 3;
