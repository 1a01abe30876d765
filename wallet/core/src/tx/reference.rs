//! Reference encoding backend built on the `bitcoin` crate.
//!
//! Drives the exact same inputs/outputs as the first-party encoder
//! through a third-party serializer, so the two can be compared
//! byte-for-byte. The crate has no notion of fork-id sighashes, which the
//! builder screens out before reaching this module.

use crate::error::Error;
use crate::result::Result;
use crate::tx::native::{PlannedOutput, SignedInput, SEQUENCE_FINAL};
use bitcoin::hashes::Hash;
use bitcoin::sighash::SighashCache;
use bitcoin::{absolute, transaction, Amount, EcdsaSighashType, ScriptBuf, Sequence, Txid, Witness};
use chainforge_core::tx::UnspentRecord;

fn outpoint(point: &chainforge_core::tx::OutPoint) -> bitcoin::OutPoint {
    bitcoin::OutPoint {
        txid: Txid::from_byte_array(point.transaction_id.to_internal_bytes()),
        vout: point.index,
    }
}

fn unsigned_transaction(version: u32, inputs: &[UnspentRecord], outputs: &[PlannedOutput]) -> bitcoin::Transaction {
    bitcoin::Transaction {
        version: transaction::Version(version as i32),
        lock_time: absolute::LockTime::ZERO,
        input: inputs
            .iter()
            .map(|input| bitcoin::TxIn {
                previous_output: outpoint(&input.outpoint),
                script_sig: ScriptBuf::new(),
                sequence: Sequence(SEQUENCE_FINAL),
                witness: Witness::new(),
            })
            .collect(),
        output: outputs
            .iter()
            .map(|output| bitcoin::TxOut {
                value: Amount::from_sat(output.amount),
                script_pubkey: ScriptBuf::from_bytes(output.script_public_key.to_vec()),
            })
            .collect(),
    }
}

/// Legacy sighash digest for `signed_index`, committing to the spent
/// output's locking script.
pub fn legacy_sighash(
    version: u32,
    inputs: &[UnspentRecord],
    outputs: &[PlannedOutput],
    signed_index: usize,
    hash_type: u32,
) -> Result<[u8; 32]> {
    let tx = unsigned_transaction(version, inputs, outputs);
    let cache = SighashCache::new(&tx);
    let script = ScriptBuf::from_bytes(inputs[signed_index].script_public_key.to_vec());
    let digest = cache
        .legacy_signature_hash(signed_index, &script, hash_type)
        .map_err(|err| Error::UnderlyingEncodingFailure(err.to_string()))?;
    Ok(digest.to_byte_array())
}

/// BIP143 digest for a v0 witness pubkey-hash input at `signed_index`.
pub fn p2wpkh_sighash(
    version: u32,
    inputs: &[UnspentRecord],
    outputs: &[PlannedOutput],
    signed_index: usize,
) -> Result<[u8; 32]> {
    let tx = unsigned_transaction(version, inputs, outputs);
    let mut cache = SighashCache::new(&tx);
    let signed = &inputs[signed_index];
    let script = ScriptBuf::from_bytes(signed.script_public_key.to_vec());
    let digest = cache
        .p2wpkh_signature_hash(signed_index, &script, Amount::from_sat(signed.amount), EcdsaSighashType::All)
        .map_err(|err| Error::UnderlyingEncodingFailure(err.to_string()))?;
    Ok(digest.to_byte_array())
}

/// Consensus serialization of the fully signed transaction.
pub fn serialize_transaction(version: u32, inputs: &[SignedInput], outputs: &[PlannedOutput]) -> Vec<u8> {
    let tx = bitcoin::Transaction {
        version: transaction::Version(version as i32),
        lock_time: absolute::LockTime::ZERO,
        input: inputs
            .iter()
            .map(|input| bitcoin::TxIn {
                previous_output: outpoint(&input.outpoint),
                script_sig: ScriptBuf::from_bytes(input.script_sig.clone()),
                sequence: Sequence(SEQUENCE_FINAL),
                witness: Witness::from_slice(&input.witness),
            })
            .collect(),
        output: outputs
            .iter()
            .map(|output| bitcoin::TxOut {
                value: Amount::from_sat(output.amount),
                script_pubkey: ScriptBuf::from_bytes(output.script_public_key.to_vec()),
            })
            .collect(),
    };
    bitcoin::consensus::encode::serialize(&tx)
}
