//! First-party wire encoder for UTXO-chain transactions.
//!
//! Produces sighash preimages (legacy and BIP143-shaped) and the final
//! serialization. Byte-for-byte output equality with the reference
//! backend is a tested property, so every field width and ordering here
//! is deliberate.

use chainforge_core::tx::{OutPoint, ScriptVec, UnspentRecord};
use sha2::{Digest, Sha256};

/// `nSequence` value for inputs that opt out of replace-by-fee and
/// relative locktime.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// `SIGHASH_ALL`: commit to every input and output.
pub const SIG_HASH_ALL: u32 = 0x01;

/// Fork-id marker bit or'ed into the hash type on Bitcoin-Cash-style
/// chains.
pub const SIG_HASH_FORK_ID: u32 = 0x40;

/// A planned transaction output: settled amount and locking script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOutput {
    pub amount: u64,
    pub script_public_key: ScriptVec,
}

/// A fully assembled input ready for serialization. Exactly one of
/// `script_sig` / `witness` is populated for the standard input kinds.
#[derive(Debug, Clone)]
pub struct SignedInput {
    pub outpoint: OutPoint,
    pub script_sig: Vec<u8>,
    pub witness: Vec<Vec<u8>>,
}

pub(crate) fn sha256d(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

/// Bitcoin-style variable-length integer.
pub(crate) fn write_varint(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xfc => buf.push(value as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

fn write_outpoint(buf: &mut Vec<u8>, outpoint: &OutPoint) {
    buf.extend_from_slice(&outpoint.transaction_id.to_internal_bytes());
    buf.extend_from_slice(&outpoint.index.to_le_bytes());
}

fn write_output(buf: &mut Vec<u8>, output: &PlannedOutput) {
    buf.extend_from_slice(&output.amount.to_le_bytes());
    write_varint(buf, output.script_public_key.len() as u64);
    buf.extend_from_slice(&output.script_public_key);
}

/// Original sighash preimage: the transaction with every input's script
/// blanked except the signed one, which carries the spent output's
/// locking script, followed by the hash type as a 32-bit word.
pub fn legacy_sighash(
    version: u32,
    inputs: &[UnspentRecord],
    outputs: &[PlannedOutput],
    lock_time: u32,
    signed_index: usize,
    hash_type: u32,
) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(256);
    preimage.extend_from_slice(&version.to_le_bytes());
    write_varint(&mut preimage, inputs.len() as u64);
    for (index, input) in inputs.iter().enumerate() {
        write_outpoint(&mut preimage, &input.outpoint);
        if index == signed_index {
            write_varint(&mut preimage, input.script_public_key.len() as u64);
            preimage.extend_from_slice(&input.script_public_key);
        } else {
            write_varint(&mut preimage, 0);
        }
        preimage.extend_from_slice(&SEQUENCE_FINAL.to_le_bytes());
    }
    write_varint(&mut preimage, outputs.len() as u64);
    for output in outputs {
        write_output(&mut preimage, output);
    }
    preimage.extend_from_slice(&lock_time.to_le_bytes());
    preimage.extend_from_slice(&hash_type.to_le_bytes());
    sha256d(&preimage)
}

/// BIP143-shaped preimage, used both for v0 witness inputs and (with the
/// fork bits set in `hash_type`) for every input on fork-id chains.
/// `script_code` is the varint-prefixed script the input commits to — for
/// pubkey-hash inputs, the p2pkh template over the key hash.
pub fn bip143_sighash(
    version: u32,
    inputs: &[UnspentRecord],
    outputs: &[PlannedOutput],
    lock_time: u32,
    signed_index: usize,
    script_code: &[u8],
    hash_type: u32,
) -> [u8; 32] {
    let mut prevouts = Vec::with_capacity(inputs.len() * 36);
    let mut sequences = Vec::with_capacity(inputs.len() * 4);
    for input in inputs {
        write_outpoint(&mut prevouts, &input.outpoint);
        sequences.extend_from_slice(&SEQUENCE_FINAL.to_le_bytes());
    }
    let mut outs = Vec::with_capacity(outputs.len() * 34);
    for output in outputs {
        write_output(&mut outs, output);
    }

    let signed = &inputs[signed_index];
    let mut preimage = Vec::with_capacity(256);
    preimage.extend_from_slice(&version.to_le_bytes());
    preimage.extend_from_slice(&sha256d(&prevouts));
    preimage.extend_from_slice(&sha256d(&sequences));
    write_outpoint(&mut preimage, &signed.outpoint);
    write_varint(&mut preimage, script_code.len() as u64);
    preimage.extend_from_slice(script_code);
    preimage.extend_from_slice(&signed.amount.to_le_bytes());
    preimage.extend_from_slice(&SEQUENCE_FINAL.to_le_bytes());
    preimage.extend_from_slice(&sha256d(&outs));
    preimage.extend_from_slice(&lock_time.to_le_bytes());
    preimage.extend_from_slice(&hash_type.to_le_bytes());
    sha256d(&preimage)
}

/// Final serialization. The segwit marker/flag pair and the witness
/// section appear only when at least one input carries witness data;
/// an all-legacy transaction keeps the pre-segwit layout.
pub fn serialize_transaction(version: u32, inputs: &[SignedInput], outputs: &[PlannedOutput], lock_time: u32) -> Vec<u8> {
    let has_witness = inputs.iter().any(|input| !input.witness.is_empty());

    let mut tx = Vec::with_capacity(512);
    tx.extend_from_slice(&version.to_le_bytes());
    if has_witness {
        tx.push(0x00); // marker
        tx.push(0x01); // flag
    }
    write_varint(&mut tx, inputs.len() as u64);
    for input in inputs {
        write_outpoint(&mut tx, &input.outpoint);
        write_varint(&mut tx, input.script_sig.len() as u64);
        tx.extend_from_slice(&input.script_sig);
        tx.extend_from_slice(&SEQUENCE_FINAL.to_le_bytes());
    }
    write_varint(&mut tx, outputs.len() as u64);
    for output in outputs {
        write_output(&mut tx, output);
    }
    if has_witness {
        for input in inputs {
            write_varint(&mut tx, input.witness.len() as u64);
            for item in &input.witness {
                write_varint(&mut tx, item.len() as u64);
                tx.extend_from_slice(item);
            }
        }
    }
    tx.extend_from_slice(&lock_time.to_le_bytes());
    tx
}
