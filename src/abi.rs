//! ABI and RLP Encoding Helpers
//!
//! Minimal hand-rolled encoding for the fixed set of escrow contract calls:
//! keccak256 function selectors, 32-byte ABI word encode/decode for the
//! `address`, `uint256` and `bool` types, and RLP encoding for legacy
//! (pre-EIP-1559) transactions.

use sha3::{Digest, Keccak256};

use crate::error::{Result, SettlementError};

/// The EVM zero address, the escrow contract's "no courier assigned" marker.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

// ============================================================================
// FUNCTION SELECTORS
// ============================================================================

/// Compute the 4-byte function selector for a signature string,
/// e.g. `selector("assignCourier(address)")`.
pub fn selector(signature: &str) -> [u8; 4] {
    let mut hasher = Keccak256::new();
    hasher.update(signature.as_bytes());
    let hash = hasher.finalize();
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

// ============================================================================
// ABI WORD ENCODING
// ============================================================================

/// Returns true if the string is a well-formed EVM address: `0x` followed by
/// exactly 40 hex characters.
pub fn is_well_formed_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(body) => body.len() == 40 && body.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Decode a 20-byte address string into raw bytes.
pub fn address_bytes(address: &str) -> Result<Vec<u8>> {
    if !is_well_formed_address(address) {
        return Err(SettlementError::InvalidAddress(address.to_string()));
    }
    hex::decode(&address[2..])
        .map_err(|_| SettlementError::InvalidAddress(address.to_string()))
}

/// ABI-encode an address as a left-padded 32-byte word.
pub fn encode_address(address: &str) -> Result<[u8; 32]> {
    let bytes = address_bytes(address)?;
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&bytes);
    Ok(word)
}

/// ABI-encode a uint256 (from u128) as a left-padded 32-byte word.
pub fn encode_u256(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

// ============================================================================
// ABI WORD DECODING (eth_call results)
// ============================================================================

/// Strip the 0x prefix from a hex string result.
fn strip_0x(data: &str) -> &str {
    data.strip_prefix("0x").unwrap_or(data)
}

/// Decode an ABI-encoded bool return value: any nonzero word is true.
pub fn decode_bool(data: &str) -> Result<bool> {
    Ok(decode_u256(data)? != 0)
}

/// Decode an ABI-encoded address return value (last 20 bytes of the word).
pub fn decode_address(data: &str) -> Result<String> {
    let clean = strip_0x(data);
    if clean.len() < 64 {
        return Err(SettlementError::ChainTransport(format!(
            "eth_call address result too short: {} hex chars",
            clean.len()
        )));
    }
    Ok(format!("0x{}", &clean[clean.len() - 40..].to_lowercase()))
}

/// Decode an ABI-encoded uint256 return value into a u128.
pub fn decode_u256(data: &str) -> Result<u128> {
    let clean = strip_0x(data);
    if clean.is_empty() {
        return Err(SettlementError::ChainTransport(
            "empty eth_call result for uint256".to_string(),
        ));
    }
    let trimmed = clean.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(trimmed, 16).map_err(|e| {
        SettlementError::ChainTransport(format!("failed to parse uint256 result: {}", e))
    })
}

// ============================================================================
// RLP ENCODING (legacy EVM transactions)
// ============================================================================

/// Encode a u64 as big-endian bytes with no leading zeros (RLP integer format).
pub fn rlp_encode_u64(val: u64) -> Vec<u8> {
    if val == 0 {
        return vec![];
    }
    let bytes = val.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(8);
    bytes[start..].to_vec()
}

/// Encode a u128 as big-endian bytes with no leading zeros (RLP integer format).
pub fn rlp_encode_u128(val: u128) -> Vec<u8> {
    if val == 0 {
        return vec![];
    }
    let bytes = val.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(16);
    bytes[start..].to_vec()
}

/// RLP-encode a single byte-string item.
fn rlp_encode_item(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        // Single byte below 0x80: encoded as itself
        vec![data[0]]
    } else if data.is_empty() {
        // Empty bytes: 0x80
        vec![0x80]
    } else if data.len() <= 55 {
        let mut out = vec![0x80 + data.len() as u8];
        out.extend_from_slice(data);
        out
    } else {
        let len_bytes = rlp_encode_u64(data.len() as u64);
        let mut out = vec![0xb7 + len_bytes.len() as u8];
        out.extend_from_slice(&len_bytes);
        out.extend_from_slice(data);
        out
    }
}

/// RLP-encode a list of items (each item is raw bytes, NOT yet RLP-encoded).
pub fn rlp_encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = Vec::new();
    for item in items {
        payload.extend(rlp_encode_item(item));
    }

    if payload.len() <= 55 {
        let mut out = vec![0xc0 + payload.len() as u8];
        out.extend(payload);
        out
    } else {
        let len_bytes = rlp_encode_u64(payload.len() as u64);
        let mut out = vec![0xf7 + len_bytes.len() as u8];
        out.extend_from_slice(&len_bytes);
        out.extend(payload);
        out
    }
}
