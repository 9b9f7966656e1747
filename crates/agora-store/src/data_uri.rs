//! Data-URI encoding of media payloads.
//!
//! URI format: `data:<mime>;base64,<payload>`.  Decoding must round-trip to
//! the original bytes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{Result, StoreError};

/// Encode raw bytes as a base64 data URI.
pub fn encode(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
}

/// Decode a data URI back into `(mime_type, bytes)`.
pub fn decode(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| StoreError::Corrupt("missing data: scheme".to_string()))?;

    let (mime_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| StoreError::Corrupt("missing base64 marker".to_string()))?;

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| StoreError::Corrupt(format!("base64 decode failed: {e}")))?;

    Ok((mime_type.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        let uri = encode(&bytes, "image/jpeg");
        assert!(uri.starts_with("data:image/jpeg;base64,"));

        let (mime, decoded) = decode(&uri).unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn decode_rejects_non_data_uri() {
        assert!(matches!(
            decode("https://example.com/cat.png"),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn decode_rejects_bad_base64() {
        assert!(matches!(
            decode("data:image/png;base64,!!!not-base64!!!"),
            Err(StoreError::Corrupt(_))
        ));
    }
}
