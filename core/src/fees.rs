use serde::{Deserialize, Serialize};

/// Transaction fee. The `amount` is authoritative — builders add it to the
/// selection target verbatim and never recompute it. `params` carries the
/// chain-specific auxiliary data the fee was derived from, so callers can
/// re-estimate after the fact.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct Fee {
    /// Total fee in base units of the native denomination.
    pub amount: u64,
    pub params: FeeParams,
}

impl Fee {
    pub fn new(amount: u64, params: FeeParams) -> Self {
        Self { amount, params }
    }

    /// A flat fee with no auxiliary parameters.
    pub fn fixed(amount: u64) -> Self {
        Self { amount, params: FeeParams::Fixed }
    }
}

/// Chain-specific fee parameters.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum FeeParams {
    /// No auxiliary data; the amount stands alone.
    Fixed,
    /// UTXO chains: base units per serialized byte.
    PerByte { rate: u64 },
    /// Account chains: execution gas.
    Gas { limit: u64, price: u64 },
}

impl From<u64> for Fee {
    fn from(amount: u64) -> Self {
        Fee::fixed(amount)
    }
}
