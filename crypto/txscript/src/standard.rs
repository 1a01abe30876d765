use crate::opcodes::codes::{Op0, OpCheckSig, OpData20, OpDup, OpEqual, OpEqualVerify, OpHash160};
use crate::TxScriptError;
use chainforge_addresses::{decode, DecodedAddress};
use chainforge_core::network::NetworkParams;
use chainforge_core::tx::ScriptVec;
use sha2::{Digest, Sha256};
use std::iter::once;

/// Standard script shapes the UTXO builder understands. The class of the
/// spent record's locking script decides the per-input sighash flavor.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ScriptClass {
    PubKeyHash,
    ScriptHash,
    WitnessV0PubKeyHash,
    WitnessV0ScriptHash,
    NonStandard,
}

/// Creates a new script to pay a transaction output to a 20-byte
/// pubkey hash.
fn pay_to_pub_key_hash(hash: &[u8]) -> ScriptVec {
    assert_eq!(hash.len(), 20);
    ScriptVec::from_iter(
        [OpDup, OpHash160, OpData20]
            .into_iter()
            .chain(hash.iter().copied())
            .chain([OpEqualVerify, OpCheckSig]),
    )
}

/// Creates a new script to pay a transaction output to a script hash.
/// It is expected that the input is a valid hash.
fn pay_to_script_hash(hash: &[u8]) -> ScriptVec {
    assert_eq!(hash.len(), 20);
    ScriptVec::from_iter([OpHash160, OpData20].into_iter().chain(hash.iter().copied()).chain(once(OpEqual)))
}

/// Creates a new v0 witness-program script for a 20- or 32-byte program.
fn pay_to_witness_program(program: &[u8]) -> ScriptVec {
    assert!(program.len() == 20 || program.len() == 32);
    ScriptVec::from_iter([Op0, program.len() as u8].into_iter().chain(program.iter().copied()))
}

/// Derives the canonical spending condition for a destination address on
/// the given chain. Unsupported or malformed addresses are an error, never
/// a best-effort script.
pub fn locking_script(address: &str, params: &NetworkParams) -> Result<ScriptVec, TxScriptError> {
    let decoded = decode(address, params)
        .map_err(|source| TxScriptError::UnsupportedAddress { address: address.to_string(), source })?;
    Ok(match decoded {
        DecodedAddress::PubKeyHash(hash) => pay_to_pub_key_hash(&hash),
        DecodedAddress::ScriptHash(hash) => pay_to_script_hash(&hash),
        DecodedAddress::WitnessProgram { program, .. } => pay_to_witness_program(&program),
    })
}

/// The reduction hash of an address's locking script, as used by
/// Electrum-style lookup protocols: sha256 of the script, byte-reversed,
/// hex. Shares the derivation path with [`locking_script`] so the two can
/// never diverge.
pub fn script_hash(address: &str, params: &NetworkParams) -> Result<String, TxScriptError> {
    let script = locking_script(address, params)?;
    let mut digest: [u8; 32] = Sha256::digest(&script).into();
    digest.reverse();
    Ok(hex::encode(digest))
}

/// Classifies a locking script into one of the standard shapes.
#[allow(non_upper_case_globals)]
pub fn classify_script(script: &[u8]) -> ScriptClass {
    match script {
        [OpDup, OpHash160, OpData20, .., OpEqualVerify, OpCheckSig] if script.len() == 25 => ScriptClass::PubKeyHash,
        [OpHash160, OpData20, .., OpEqual] if script.len() == 23 => ScriptClass::ScriptHash,
        [Op0, 0x14, ..] if script.len() == 22 => ScriptClass::WitnessV0PubKeyHash,
        [Op0, 0x20, ..] if script.len() == 34 => ScriptClass::WitnessV0ScriptHash,
        _ => ScriptClass::NonStandard,
    }
}

/// Extracts the 20-byte hash committed to by a p2pkh or v0 witness
/// pubkey-hash script.
pub fn extract_pub_key_hash(script: &[u8]) -> Option<[u8; 20]> {
    match classify_script(script) {
        ScriptClass::PubKeyHash => script[3..23].try_into().ok(),
        ScriptClass::WitnessV0PubKeyHash => script[2..22].try_into().ok(),
        _ => None,
    }
}
