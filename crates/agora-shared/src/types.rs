use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_AVATAR_ID, PLACEHOLDER_PREFIX};
use crate::error::ParseError;

// Wallet account = secp256k1 address (20 bytes), displayed as lowercase hex
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse a `0x`-prefixed (or bare) 40-character hex string.
    /// Mixed-case input is accepted and normalized to lowercase.
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != 40 {
            return Err(ParseError::InvalidLength {
                expected: 40,
                got: stripped.len(),
            });
        }
        let bytes = hex::decode(stripped.to_ascii_lowercase())?;
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn short(&self) -> String {
        let full = self.to_hex();
        format!("{}…{}", &full[..6], &full[full.len() - 4..])
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Hex form used by `eth_chainId` / `wallet_switchEthereumChain` params.
    pub fn to_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        u64::from_str_radix(stripped, 16)
            .map(Self)
            .map_err(|e| ParseError::InvalidNumber(e.to_string()))
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != 64 {
            return Err(ParseError::InvalidLength {
                expected: 64,
                got: stripped.len(),
            });
        }
        let bytes = hex::decode(stripped)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Opaque identifier of a record in the local media store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MediaId(pub String);

impl MediaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reserved sentinel meaning "no real media".
    pub fn default_avatar() -> Self {
        Self(DEFAULT_AVATAR_ID.to_string())
    }

    /// Placeholder identifiers are deliberately never resolved by the store.
    pub fn is_placeholder(&self) -> bool {
        self.0 == DEFAULT_AVATAR_ID || self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection state of the wallet adapter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    ConnectedWrongChain,
    ConnectedReady,
}

/// On-chain user record as returned by the contract's `getUser`.
///
/// Mirrored into the session after every mutating call; never constructed
/// from a locally-computed projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub address: Address,
    pub username: String,
    pub bio: String,
    /// Media identifier of the avatar; the default sentinel when unset.
    pub avatar: MediaId,
    pub is_creator: bool,
    pub followers: u64,
    pub following: u64,
    /// Cumulative creator earnings in wei.
    pub total_earnings: u128,
    /// Whether the contract has a record for this address at all.
    pub exists: bool,
}

/// Structured result returned by every feature operation.
///
/// `success && unconfirmed` means the transaction was accepted but the
/// follow-up profile re-fetch never observed the expected change: likely
/// fine, refresh later. Operations never return a raw error to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub success: bool,
    pub unconfirmed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<MediaId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
}

impl OperationOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            unconfirmed: false,
            message: message.into(),
            media_id: None,
            tx_hash: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            unconfirmed: false,
            message: message.into(),
            media_id: None,
            tx_hash: None,
        }
    }

    pub fn unconfirmed(message: impl Into<String>) -> Self {
        Self {
            success: true,
            unconfirmed: true,
            message: message.into(),
            media_id: None,
            tx_hash: None,
        }
    }

    pub fn with_media(mut self, media_id: MediaId) -> Self {
        self.media_id = Some(media_id);
        self
    }

    pub fn with_tx(mut self, tx_hash: TxHash) -> Self {
        self.tx_hash = Some(tx_hash);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trip() {
        let addr = Address::from_hex("0xAbCd000000000000000000000000000000001234").unwrap();
        assert_eq!(addr.to_hex(), "0xabcd000000000000000000000000000000001234");
        assert_eq!(Address::from_hex(&addr.to_hex()).unwrap(), addr);
    }

    #[test]
    fn address_rejects_wrong_length() {
        assert!(Address::from_hex("0x1234").is_err());
    }

    #[test]
    fn chain_id_hex_round_trip() {
        let id = ChainId(80002);
        assert_eq!(id.to_hex(), "0x13882");
        assert_eq!(ChainId::from_hex("0x13882").unwrap(), id);
    }

    #[test]
    fn placeholder_detection() {
        assert!(MediaId::default_avatar().is_placeholder());
        assert!(MediaId::new("placeholder_banner").is_placeholder());
        assert!(!MediaId::new("media_1700000000000_a1b2c3").is_placeholder());
    }
}
