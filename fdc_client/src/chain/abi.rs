//! Minimal ABI plumbing for the handful of contract calls the client makes.
//!
//! Calldata is built by hand: four-byte Keccak selector followed by
//! head/tail-encoded arguments. Only the shapes the client needs are
//! implemented — a single dynamic `bytes` argument, a `(uint256, uint256)`
//! pair, and the `(bytes32[], bytes)` pair the proof consumer submits.

use ethereum_types::U256;
use sha3::{Digest, Keccak256};

/// First four bytes of keccak256 of the canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&digest[..4]);
    sel
}

fn word_u256(value: U256) -> [u8; 32] {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    buf
}

fn word_u64(value: u64) -> [u8; 32] {
    word_u256(U256::from(value))
}

/// Length word followed by the data padded right to a 32-byte boundary.
fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + data.len().div_ceil(32) * 32);
    out.extend_from_slice(&word_u64(data.len() as u64));
    out.extend_from_slice(data);
    let pad = data.len().div_ceil(32) * 32 - data.len();
    out.extend(std::iter::repeat(0u8).take(pad));
    out
}

/// Calldata for `f(bytes)`.
pub fn call_with_bytes(signature: &str, data: &[u8]) -> String {
    let mut calldata = Vec::new();
    calldata.extend_from_slice(&selector(signature));
    calldata.extend_from_slice(&word_u64(0x20));
    calldata.extend_from_slice(&encode_bytes(data));
    format!("0x{}", hex::encode(calldata))
}

/// Calldata for `f(uint256,uint256)`.
pub fn call_with_u256_pair(signature: &str, a: U256, b: U256) -> String {
    let mut calldata = Vec::new();
    calldata.extend_from_slice(&selector(signature));
    calldata.extend_from_slice(&word_u256(a));
    calldata.extend_from_slice(&word_u256(b));
    format!("0x{}", hex::encode(calldata))
}

/// Calldata for a no-argument constant read.
pub fn call_no_args(signature: &str) -> String {
    format!("0x{}", hex::encode(selector(signature)))
}

/// Calldata for `f(bytes32[],bytes)` — the Merkle proof elements and the
/// attested payload handed to the destination contract.
pub fn call_with_proof(
    signature: &str,
    merkle_elements: &[String],
    payload: &[u8],
) -> Result<String, String> {
    let mut elements = Vec::with_capacity(merkle_elements.len());
    for raw in merkle_elements {
        let stripped = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes =
            hex::decode(stripped).map_err(|e| format!("merkle element {raw:?} is not hex: {e}"))?;
        if bytes.len() != 32 {
            return Err(format!("merkle element {raw:?} is not 32 bytes"));
        }
        elements.push(bytes);
    }

    // Head: offsets of the two dynamic tails, relative to the args start.
    let proof_tail_len = 32 * (1 + elements.len());
    let mut calldata = Vec::new();
    calldata.extend_from_slice(&selector(signature));
    calldata.extend_from_slice(&word_u64(0x40));
    calldata.extend_from_slice(&word_u64((0x40 + proof_tail_len) as u64));
    calldata.extend_from_slice(&word_u64(elements.len() as u64));
    for element in &elements {
        calldata.extend_from_slice(element);
    }
    calldata.extend_from_slice(&encode_bytes(payload));
    Ok(format!("0x{}", hex::encode(calldata)))
}

fn decode_word(result: &str) -> Result<[u8; 32], String> {
    let stripped = result.strip_prefix("0x").unwrap_or(result);
    let bytes = hex::decode(stripped).map_err(|e| format!("call result is not hex: {e}"))?;
    if bytes.len() != 32 {
        return Err(format!("expected a single 32-byte word, got {} bytes", bytes.len()));
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes);
    Ok(word)
}

pub fn decode_u256(result: &str) -> Result<U256, String> {
    Ok(U256::from_big_endian(&decode_word(result)?))
}

pub fn decode_u64(result: &str) -> Result<u64, String> {
    let value = decode_u256(result)?;
    if value > U256::from(u64::MAX) {
        return Err(format!("value {value} does not fit in u64"));
    }
    Ok(value.as_u64())
}

/// A `bool` return word is canonically 31 zero bytes followed by 0 or 1;
/// anything else is a malformed result, not a truthy value.
pub fn decode_bool(result: &str) -> Result<bool, String> {
    let word = decode_word(result)?;
    if word[..31].iter().any(|b| *b != 0) || word[31] > 1 {
        return Err(format!("not a canonical bool word: {result:?}"));
    }
    Ok(word[31] == 1)
}
