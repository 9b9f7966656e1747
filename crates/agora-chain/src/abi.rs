//! Minimal ABI layer for the fixed content-contract surface.
//!
//! Calldata layout: 4-byte selector, then a head word per argument, then the
//! tail holding dynamic data. Selectors are precomputed keccak-256 prefixes
//! of the canonical signatures, embedded the same way the contract ABI is.

use agora_shared::Address;

use crate::error::ChainError;

/// The contract ABI as a structured definition.
///
/// Initialization validates this is a non-empty array before building a
/// handle; it is also the single place the callable surface is written down.
pub const CONTRACT_ABI_JSON: &str = r#"[
  {"type":"function","name":"registerUser","inputs":[{"name":"username","type":"string"},{"name":"avatarHash","type":"string"},{"name":"bio","type":"string"}],"outputs":[],"stateMutability":"nonpayable"},
  {"type":"function","name":"updateProfile","inputs":[{"name":"username","type":"string"},{"name":"avatarHash","type":"string"},{"name":"bio","type":"string"}],"outputs":[],"stateMutability":"nonpayable"},
  {"type":"function","name":"becomeCreator","inputs":[],"outputs":[],"stateMutability":"nonpayable"},
  {"type":"function","name":"createContent","inputs":[{"name":"contentHash","type":"string"},{"name":"price","type":"uint256"},{"name":"isPaid","type":"bool"}],"outputs":[],"stateMutability":"nonpayable"},
  {"type":"function","name":"createStory","inputs":[{"name":"contentHash","type":"string"}],"outputs":[],"stateMutability":"nonpayable"},
  {"type":"function","name":"getUser","inputs":[{"name":"wallet","type":"address"}],"outputs":[{"name":"username","type":"string"},{"name":"avatarHash","type":"string"},{"name":"bio","type":"string"},{"name":"isCreator","type":"bool"},{"name":"followersCount","type":"uint256"},{"name":"followingCount","type":"uint256"},{"name":"totalEarnings","type":"uint256"},{"name":"exists","type":"bool"}],"stateMutability":"view"},
  {"type":"function","name":"contentCounter","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
  {"type":"function","name":"storyCounter","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
  {"type":"function","name":"getUserContents","inputs":[{"name":"wallet","type":"address"}],"outputs":[{"name":"","type":"uint256[]"}],"stateMutability":"view"},
  {"type":"function","name":"getUserStories","inputs":[{"name":"wallet","type":"address"}],"outputs":[{"name":"","type":"uint256[]"}],"stateMutability":"view"}
]"#;

// keccak-256("<signature>")[..4]
pub const SEL_REGISTER_USER: [u8; 4] = [0xd6, 0x37, 0xdc, 0xfa]; // registerUser(string,string,string)
pub const SEL_UPDATE_PROFILE: [u8; 4] = [0x11, 0x05, 0xa5, 0xeb]; // updateProfile(string,string,string)
pub const SEL_BECOME_CREATOR: [u8; 4] = [0xeb, 0x42, 0x1e, 0xd6]; // becomeCreator()
pub const SEL_CREATE_CONTENT: [u8; 4] = [0xd6, 0x51, 0x48, 0xc3]; // createContent(string,uint256,bool)
pub const SEL_CREATE_STORY: [u8; 4] = [0x9d, 0x9f, 0x92, 0xd8]; // createStory(string)
pub const SEL_GET_USER: [u8; 4] = [0x6f, 0x77, 0x92, 0x6b]; // getUser(address)
pub const SEL_CONTENT_COUNTER: [u8; 4] = [0xe6, 0xa9, 0xab, 0xa3]; // contentCounter()
pub const SEL_STORY_COUNTER: [u8; 4] = [0x2c, 0x70, 0x4e, 0x3d]; // storyCounter()
pub const SEL_GET_USER_CONTENTS: [u8; 4] = [0x8d, 0xc8, 0xfb, 0x93]; // getUserContents(address)
pub const SEL_GET_USER_STORIES: [u8; 4] = [0xf5, 0x90, 0x9b, 0xf4]; // getUserStories(address)

/// An argument value for the supported parameter types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Uint(u128),
    Bool(bool),
    Str(String),
}

/// Decoded `getUser` return tuple, field order as declared by the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUser {
    pub username: String,
    pub avatar_hash: String,
    pub bio: String,
    pub is_creator: bool,
    pub followers: u128,
    pub following: u128,
    pub total_earnings: u128,
    pub exists: bool,
}

fn uint_word(v: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&v.to_be_bytes());
    word
}

fn address_word(a: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&a.0);
    word
}

fn bool_word(b: bool) -> [u8; 32] {
    uint_word(b as u128)
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(32) * 32
}

/// Encode a call: selector, head words, dynamic tail.
pub fn encode_call(selector: [u8; 4], args: &[AbiValue]) -> Vec<u8> {
    let head_len = args.len() * 32;
    let mut head: Vec<u8> = Vec::with_capacity(head_len);
    let mut tail: Vec<u8> = Vec::new();

    for arg in args {
        match arg {
            AbiValue::Address(a) => head.extend_from_slice(&address_word(a)),
            AbiValue::Uint(v) => head.extend_from_slice(&uint_word(*v)),
            AbiValue::Bool(b) => head.extend_from_slice(&bool_word(*b)),
            AbiValue::Str(s) => {
                // Head word is the offset of the string data, measured from
                // the start of the argument area.
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
                let bytes = s.as_bytes();
                tail.extend_from_slice(&uint_word(bytes.len() as u128));
                tail.extend_from_slice(bytes);
                tail.resize(tail.len() + padded_len(bytes.len()) - bytes.len(), 0);
            }
        }
    }

    let mut out = Vec::with_capacity(4 + head_len + tail.len());
    out.extend_from_slice(&selector);
    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    out
}

fn word(data: &[u8], index: usize) -> Result<&[u8], ChainError> {
    data.get(index * 32..index * 32 + 32)
        .ok_or_else(|| ChainError::Abi(format!("return data too short for word {index}")))
}

fn read_uint(w: &[u8]) -> Result<u128, ChainError> {
    if w[..16].iter().any(|&b| b != 0) {
        return Err(ChainError::Abi("uint256 exceeds u128 range".to_string()));
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&w[16..]);
    Ok(u128::from_be_bytes(bytes))
}

fn read_bool(w: &[u8]) -> Result<bool, ChainError> {
    Ok(read_uint(w)? != 0)
}

fn read_string(data: &[u8], head_index: usize) -> Result<String, ChainError> {
    let offset = read_uint(word(data, head_index)?)? as usize;
    if offset % 32 != 0 {
        return Err(ChainError::Abi(format!("misaligned string offset {offset}")));
    }
    let len = read_uint(word(data, offset / 32)?)? as usize;
    let bytes = data
        .get(offset + 32..offset + 32 + len)
        .ok_or_else(|| ChainError::Abi("string data truncated".to_string()))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| ChainError::Abi(format!("bad utf-8: {e}")))
}

/// Decode `count` consecutive `string` arguments from a call's argument
/// area (the calldata after the selector). Used by mock backends to recover
/// what a submitted call carried.
pub fn decode_strings(args: &[u8], count: usize) -> Result<Vec<String>, ChainError> {
    (0..count).map(|i| read_string(args, i)).collect()
}

/// Decode a single `uint256` return value.
pub fn decode_uint(data: &[u8]) -> Result<u128, ChainError> {
    read_uint(word(data, 0)?)
}

/// Decode a `uint256[]` return value.
pub fn decode_uint_array(data: &[u8]) -> Result<Vec<u128>, ChainError> {
    let offset = read_uint(word(data, 0)?)? as usize;
    if offset % 32 != 0 {
        return Err(ChainError::Abi(format!("misaligned array offset {offset}")));
    }
    let len = read_uint(word(data, offset / 32)?)? as usize;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        out.push(read_uint(word(data, offset / 32 + 1 + i)?)?);
    }
    Ok(out)
}

/// Decode the `getUser` return tuple.
pub fn decode_user(data: &[u8]) -> Result<RawUser, ChainError> {
    Ok(RawUser {
        username: read_string(data, 0)?,
        avatar_hash: read_string(data, 1)?,
        bio: read_string(data, 2)?,
        is_creator: read_bool(word(data, 3)?)?,
        followers: read_uint(word(data, 4)?)?,
        following: read_uint(word(data, 5)?)?,
        total_earnings: read_uint(word(data, 6)?)?,
        exists: read_bool(word(data, 7)?)?,
    })
}

/// Encode a `getUser`-shaped tuple. Mutating calls have no return data to
/// decode, so outside tests this is only exercised by mock backends.
pub fn encode_user(user: &RawUser) -> Vec<u8> {
    let head_len = 8 * 32;
    let mut head: Vec<u8> = Vec::new();
    let mut tail: Vec<u8> = Vec::new();

    for s in [&user.username, &user.avatar_hash, &user.bio] {
        head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
        let bytes = s.as_bytes();
        tail.extend_from_slice(&uint_word(bytes.len() as u128));
        tail.extend_from_slice(bytes);
        tail.resize(tail.len() + padded_len(bytes.len()) - bytes.len(), 0);
    }
    head.extend_from_slice(&bool_word(user.is_creator));
    head.extend_from_slice(&uint_word(user.followers));
    head.extend_from_slice(&uint_word(user.following));
    head.extend_from_slice(&uint_word(user.total_earnings));
    head.extend_from_slice(&bool_word(user.exists));

    head.extend_from_slice(&tail);
    head
}

/// Encode a bare `uint256` word (counters, mock return values).
pub fn encode_uint(v: u128) -> Vec<u8> {
    uint_word(v).to_vec()
}

/// Encode a `uint256[]` return value.
pub fn encode_uint_array(values: &[u128]) -> Vec<u8> {
    let mut out = uint_word(32).to_vec();
    out.extend_from_slice(&uint_word(values.len() as u128));
    for v in values {
        out.extend_from_slice(&uint_word(*v));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_static_args() {
        let addr = Address::from_hex("0x00000000000000000000000000000000000000ff").unwrap();
        let data = encode_call(SEL_GET_USER, &[AbiValue::Address(addr)]);

        assert_eq!(&data[..4], &SEL_GET_USER);
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(data[4 + 31], 0xff);
        assert!(data[4..4 + 12].iter().all(|&b| b == 0));
    }

    #[test]
    fn encodes_dynamic_strings() {
        let data = encode_call(
            SEL_CREATE_STORY,
            &[AbiValue::Str("hello".to_string())],
        );

        // selector + offset word + length word + padded payload
        assert_eq!(data.len(), 4 + 32 + 32 + 32);
        assert_eq!(read_uint(&data[4..36]).unwrap(), 32); // offset past 1 head word
        assert_eq!(read_uint(&data[36..68]).unwrap(), 5); // "hello"
        assert_eq!(&data[68..73], b"hello");
        assert!(data[73..].iter().all(|&b| b == 0));
    }

    #[test]
    fn mixed_args_place_tail_after_head() {
        let data = encode_call(
            SEL_CREATE_CONTENT,
            &[
                AbiValue::Str("media_1_abc".to_string()),
                AbiValue::Uint(1_000_000),
                AbiValue::Bool(true),
            ],
        );

        let args = &data[4..];
        // Three head words, then the string tail at offset 96.
        assert_eq!(read_uint(&args[..32]).unwrap(), 96);
        assert_eq!(read_uint(&args[32..64]).unwrap(), 1_000_000);
        assert_eq!(read_uint(&args[64..96]).unwrap(), 1);
        assert_eq!(read_uint(&args[96..128]).unwrap(), 11);
    }

    #[test]
    fn uint_round_trip() {
        assert_eq!(decode_uint(&encode_uint(0)).unwrap(), 0);
        assert_eq!(decode_uint(&encode_uint(u128::MAX)).unwrap(), u128::MAX);
    }

    #[test]
    fn uint_above_u128_is_rejected() {
        let mut data = vec![0u8; 32];
        data[15] = 1; // 2^128
        assert!(matches!(decode_uint(&data), Err(ChainError::Abi(_))));
    }

    #[test]
    fn uint_array_round_trip() {
        let values = vec![1, 2, 3, 5, 8];
        assert_eq!(decode_uint_array(&encode_uint_array(&values)).unwrap(), values);
        assert!(decode_uint_array(&encode_uint_array(&[])).unwrap().is_empty());
    }

    #[test]
    fn user_tuple_round_trip() {
        let user = RawUser {
            username: "alice".to_string(),
            avatar_hash: "default_avatar".to_string(),
            bio: "hi".to_string(),
            is_creator: false,
            followers: 12,
            following: 3,
            total_earnings: 0,
            exists: true,
        };

        assert_eq!(decode_user(&encode_user(&user)).unwrap(), user);
    }

    #[test]
    fn truncated_return_data_is_an_abi_error() {
        assert!(matches!(decode_uint(&[0u8; 12]), Err(ChainError::Abi(_))));
        assert!(matches!(decode_user(&[0u8; 64]), Err(ChainError::Abi(_))));
    }

    #[test]
    fn abi_definition_is_a_non_empty_array() {
        let parsed: serde_json::Value = serde_json::from_str(CONTRACT_ABI_JSON).unwrap();
        assert!(!parsed.as_array().unwrap().is_empty());
    }
}
