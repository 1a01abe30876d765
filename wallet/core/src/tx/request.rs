//! Representation-independent request hashing for remote-call chains.
//!
//! A request is a string-keyed map of values; its identity is the hash of
//! the sorted `sha256(key) || hash(value)` pairs, independent of any
//! particular serialization. The signable digest prefixes the request id
//! with a domain separator so a request id can never be confused with
//! any other signed payload.

use sha2::{Digest, Sha256};

/// Domain separator prepended to a request id before signing.
pub const REQUEST_DOMAIN: &[u8] = b"\x0Aic-request";

/// A value inside a request map. Maps are kept as ordered pairs; the
/// hashing below sorts where the format demands it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Nat(u64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    Map(Vec<(String, Value)>),
}

/// Unsigned LEB128, the variable-width integer encoding the hashing
/// scheme mandates for naturals.
pub fn leb128_encode(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

fn hash_value(value: &Value) -> [u8; 32] {
    match value {
        Value::Nat(n) => Sha256::digest(leb128_encode(*n)).into(),
        Value::Bytes(bytes) => Sha256::digest(bytes).into(),
        Value::Text(text) => Sha256::digest(text.as_bytes()).into(),
        Value::Array(items) => {
            let mut hasher = Sha256::new();
            for item in items {
                hasher.update(hash_value(item));
            }
            hasher.finalize().into()
        }
        Value::Map(pairs) => representation_hash(pairs),
    }
}

/// The representation-independent hash of a request map.
pub fn representation_hash(pairs: &[(String, Value)]) -> [u8; 32] {
    let mut hashed: Vec<[u8; 64]> = pairs
        .iter()
        .map(|(key, value)| {
            let mut pair = [0u8; 64];
            pair[..32].copy_from_slice(&Sha256::digest(key.as_bytes()));
            pair[32..].copy_from_slice(&hash_value(value));
            pair
        })
        .collect();
    hashed.sort_unstable();

    let mut hasher = Sha256::new();
    for pair in &hashed {
        hasher.update(pair);
    }
    hasher.finalize().into()
}

/// The digest an external signer signs for a request: the domain
/// separator followed by the request id, hashed once more.
pub fn signing_digest(request_id: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(REQUEST_DOMAIN);
    hasher.update(request_id);
    hasher.finalize().into()
}
