//! Serialized-size and fee estimation for UTXO-chain transactions.
//!
//! The builder never invents a fee — `fee.amount` on the intent is
//! authoritative. These helpers exist for callers quoting a per-byte fee
//! before they assemble an intent.

use chainforge_core::fees::FeeParams;

/// version + locktime + the two count varints of a small transaction.
const TX_OVERHEAD: u64 = 10;

/// outpoint (36) + script length (1) + `<der+hashtype> <pubkey>` script
/// (107 worst case) + sequence (4).
const LEGACY_INPUT_SIZE: u64 = 148;

/// outpoint (36) + empty script (1) + sequence (4) + the witness stack's
/// share (107 witness bytes, quartered and rounded up).
const WITNESS_INPUT_VSIZE: u64 = 68;

/// amount (8) + script length (1) + p2pkh script (25).
const OUTPUT_SIZE: u64 = 34;

/// Worst-case virtual size of a transaction with the given shape.
pub fn estimate_transaction_size(input_count: u64, output_count: u64, witness_inputs: bool) -> u64 {
    let per_input = if witness_inputs { WITNESS_INPUT_VSIZE } else { LEGACY_INPUT_SIZE };
    let marker_share = if witness_inputs { 1 } else { 0 };
    TX_OVERHEAD + marker_share + input_count * per_input + output_count * OUTPUT_SIZE
}

/// Fee for a transaction of `size` bytes under the given parameters.
/// `Fixed` has no size component; `Gas` never applies to UTXO chains and
/// estimates to zero rather than guessing.
pub fn estimate_fee(size: u64, params: &FeeParams) -> u64 {
    match params {
        FeeParams::Fixed => 0,
        FeeParams::PerByte { rate } => size.saturating_mul(*rate),
        FeeParams::Gas { .. } => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_estimates() {
        // the canonical 1-in 2-out legacy spend
        assert_eq!(estimate_transaction_size(1, 2, false), 226);
        // witness inputs shrink the virtual size
        assert!(estimate_transaction_size(2, 2, true) < estimate_transaction_size(2, 2, false));
    }

    #[test]
    fn test_fee_estimates() {
        assert_eq!(estimate_fee(226, &FeeParams::PerByte { rate: 10 }), 2260);
        assert_eq!(estimate_fee(226, &FeeParams::Fixed), 0);
        assert_eq!(estimate_fee(u64::MAX, &FeeParams::PerByte { rate: 2 }), u64::MAX);
    }
}
