//! Address decoding for UTXO-style chains.
//!
//! Detects the address format (base58check legacy, bech32 segwit) and
//! decodes it against a chain's [`NetworkParams`] prefixes. Decoding is
//! strict: an address that does not match the chain exactly is an error,
//! never a best-effort guess.

use chainforge_core::network::NetworkParams;
use thiserror::Error;

mod bech32;

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum AddressError {
    #[error("Address is empty")]
    Empty,

    #[error("Invalid character {0}")]
    DecodingError(char),

    #[error("Checksum is invalid")]
    BadChecksum,

    #[error("Invalid version byte {0}")]
    InvalidVersion(u8),

    #[error("Invalid payload length {0}")]
    BadLength(usize),

    #[error("Invalid prefix {0}")]
    InvalidPrefix(String),

    #[error("Unsupported witness version {0}")]
    UnsupportedWitnessVersion(u8),

    #[error("The chain has no bech32 address format")]
    NoBech32Format,

    #[error("Invalid bech32 string")]
    Bech32Format,
}

/// The spending condition an address encodes.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum DecodedAddress {
    PubKeyHash([u8; 20]),
    ScriptHash([u8; 20]),
    WitnessProgram { version: u8, program: Vec<u8> },
}

/// Decodes `address` against the chain described by `params`.
pub fn decode(address: &str, params: &NetworkParams) -> Result<DecodedAddress, AddressError> {
    if address.is_empty() {
        return Err(AddressError::Empty);
    }

    if let Some(hrp) = params.bech32_hrp {
        if has_bech32_hrp(address, hrp) {
            return bech32::decode_segwit(address, hrp);
        }
    }

    decode_base58(address, params)
}

fn has_bech32_hrp(address: &str, hrp: &str) -> bool {
    let lower = address.to_ascii_lowercase();
    lower.len() > hrp.len() + 1 && lower.starts_with(hrp) && lower.as_bytes()[hrp.len()] == b'1'
}

fn decode_base58(address: &str, params: &NetworkParams) -> Result<DecodedAddress, AddressError> {
    let decoded = bs58::decode(address).with_check(None).into_vec().map_err(|err| match err {
        bs58::decode::Error::InvalidCharacter { character, .. } => AddressError::DecodingError(character),
        _ => AddressError::BadChecksum,
    })?;

    // version byte + hash160
    if decoded.len() != 21 {
        return Err(AddressError::BadLength(decoded.len()));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&decoded[1..]);

    match decoded[0] {
        v if v == params.p2pkh_prefix => Ok(DecodedAddress::PubKeyHash(hash)),
        v if v == params.p2sh_prefix => Ok(DecodedAddress::ScriptHash(hash)),
        v => Err(AddressError::InvalidVersion(v)),
    }
}
