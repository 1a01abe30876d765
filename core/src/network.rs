use crate::fees::FeeParams;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Which sighash preimage a chain commits to.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum SighashScheme {
    /// Original scheme: legacy preimage for base-script inputs, BIP143
    /// preimage for v0 witness inputs. The flavor is chosen per input from
    /// the spent record's locking script.
    Legacy,
    /// Bitcoin-Cash-style forks: BIP143-shaped preimage for every input,
    /// with the fork value or'ed into the hash type.
    ForkId(u32),
}

/// The single chain-parameter shape a chain accepts, checked uniformly at
/// the top of every `build_for_sign`.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum ParamShape {
    None,
    Memo,
    DestinationTag,
    Nonce,
}

/// Immutable per-chain constants. Adding a UTXO-style chain is a new
/// constant here, not a new builder.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct NetworkParams {
    pub name: &'static str,
    /// Number of decimal places in the display denomination.
    pub decimals: u8,
    /// Base58check version byte for pay-to-pubkey-hash addresses.
    pub p2pkh_prefix: u8,
    /// Base58check version byte for pay-to-script-hash addresses.
    pub p2sh_prefix: u8,
    /// Human readable part for bech32 addresses, when the chain has segwit.
    pub bech32_hrp: Option<&'static str>,
    /// Outputs at or below this value are not worth creating.
    pub dust_threshold: u64,
    pub tx_version: u32,
    pub sighash: SighashScheme,
    pub param_shape: ParamShape,
}

impl NetworkParams {
    pub fn accepts_fee_params(&self, params: &FeeParams) -> bool {
        matches!(params, FeeParams::Fixed | FeeParams::PerByte { .. })
    }
}

impl Display for NetworkParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

pub const BITCOIN: NetworkParams = NetworkParams {
    name: "bitcoin",
    decimals: 8,
    p2pkh_prefix: 0x00,
    p2sh_prefix: 0x05,
    bech32_hrp: Some("bc"),
    dust_threshold: 546,
    tx_version: 1,
    sighash: SighashScheme::Legacy,
    param_shape: ParamShape::None,
};

pub const LITECOIN: NetworkParams = NetworkParams {
    name: "litecoin",
    decimals: 8,
    p2pkh_prefix: 0x30,
    p2sh_prefix: 0x32,
    bech32_hrp: Some("ltc"),
    dust_threshold: 546,
    tx_version: 1,
    sighash: SighashScheme::Legacy,
    param_shape: ParamShape::None,
};

pub const DOGECOIN: NetworkParams = NetworkParams {
    name: "dogecoin",
    decimals: 8,
    p2pkh_prefix: 0x1e,
    p2sh_prefix: 0x16,
    bech32_hrp: None,
    dust_threshold: 1_000_000,
    tx_version: 1,
    sighash: SighashScheme::Legacy,
    param_shape: ParamShape::None,
};

/// Legacy base58 addresses, fork-id sighash for every input.
pub const BITCOIN_CASH: NetworkParams = NetworkParams {
    name: "bitcoin-cash",
    decimals: 8,
    p2pkh_prefix: 0x00,
    p2sh_prefix: 0x05,
    bech32_hrp: None,
    dust_threshold: 546,
    tx_version: 1,
    sighash: SighashScheme::ForkId(0),
    param_shape: ParamShape::None,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_param_acceptance() {
        assert!(BITCOIN.accepts_fee_params(&FeeParams::Fixed));
        assert!(BITCOIN.accepts_fee_params(&FeeParams::PerByte { rate: 12 }));
        assert!(!DOGECOIN.accepts_fee_params(&FeeParams::Gas { limit: 21_000, price: 5 }));
    }
}
