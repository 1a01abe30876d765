use crate::error::CoreError;
use crate::fees::Fee;
use crate::params::ChainParams;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::{Debug, Display, Formatter};
use std::str::{self, FromStr};

pub const HASH_SIZE: usize = 32;

/// Size of the inline backing store for locking scripts. Standard scripts
/// (p2pkh is the largest at 25 bytes) never spill to the heap.
pub const SCRIPT_VECTOR_SIZE: usize = 36;

/// Underlying type for locking-script bytes, sized for standard scripts.
pub type ScriptVec = SmallVec<[u8; SCRIPT_VECTOR_SIZE]>;

/// A transaction identifier in display order (the byte order block
/// explorers print). Wire encodings that require internal order reverse
/// the bytes at the encoding boundary.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Default, Serialize, Deserialize)]
pub struct TransactionId([u8; HASH_SIZE]);

impl TransactionId {
    pub fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Returns the id bytes in internal (reversed) order, as serialized
    /// inside UTXO-chain outpoints.
    pub fn to_internal_bytes(&self) -> [u8; HASH_SIZE] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut hex = [0u8; HASH_SIZE * 2];
        hex::encode_to_slice(self.0, &mut hex).expect("The output is exactly twice the size of the input");
        f.write_str(str::from_utf8(&hex).expect("hex is always valid UTF-8"))
    }
}

impl Debug for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for TransactionId {
    type Err = CoreError;

    fn from_str(hash_str: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; HASH_SIZE];
        hex::decode_to_slice(hash_str, &mut bytes).map_err(|_| CoreError::InvalidTransactionId(hash_str.to_string()))?;
        Ok(TransactionId(bytes))
    }
}

/// Reference to the output being spent. This pair is the identity of an
/// [`UnspentRecord`].
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug, Serialize, Deserialize)]
pub struct OutPoint {
    pub transaction_id: TransactionId,
    pub index: u32,
}

impl OutPoint {
    pub fn new(transaction_id: TransactionId, index: u32) -> Self {
        Self { transaction_id, index }
    }
}

impl Display for OutPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.transaction_id, self.index)
    }
}

/// A spendable record supplied by an external chain data source. Never
/// mutated in place; the ledger replaces whole per-address sets on refresh.
///
/// The locking script of the spent output travels with the record — the
/// builder derives each input's sighash flavor from it rather than assuming
/// that every input of an address shares one format.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct UnspentRecord {
    pub block_height: u64,
    pub outpoint: OutPoint,
    pub amount: u64,
    pub script_public_key: ScriptVec,
}

impl UnspentRecord {
    pub fn new(block_height: u64, transaction_id: TransactionId, index: u32, amount: u64, script_public_key: &[u8]) -> Self {
        Self {
            block_height,
            outpoint: OutPoint::new(transaction_id, index),
            amount,
            script_public_key: ScriptVec::from_slice(script_public_key),
        }
    }

    /// Deterministic ordering key for coin selection.
    pub fn selection_key(&self) -> (u64, TransactionId, u32) {
        (self.block_height, self.outpoint.transaction_id, self.outpoint.index)
    }
}

impl PartialOrd for UnspentRecord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UnspentRecord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.selection_key().cmp(&other.selection_key())
    }
}

/// What the user wants to do, as an immutable value. `amount` and
/// `fee.amount` are independent — no builder deducts the fee from the
/// amount implicitly.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub amount: u64,
    pub fee: Fee,
    pub source_address: String,
    pub destination_address: String,
    pub change_address: String,
    pub params: Option<ChainParams>,
}

impl TransactionIntent {
    pub fn new(
        amount: u64,
        fee: Fee,
        source_address: impl Into<String>,
        destination_address: impl Into<String>,
        change_address: impl Into<String>,
        params: Option<ChainParams>,
    ) -> Self {
        Self {
            amount,
            fee,
            source_address: source_address.into(),
            destination_address: destination_address.into(),
            change_address: change_address.into(),
            params,
        }
    }
}
