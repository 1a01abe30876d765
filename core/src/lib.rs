//! Chainforge transaction primitives.
//!
//! This crate holds the value objects shared by every chain builder:
//! transaction identifiers, unspent records, the immutable transaction
//! intent, fee descriptors, chain-specific parameter variants and the
//! per-chain [`network::NetworkParams`] data describing address prefixes,
//! script variants and sighash flavor.

pub mod amount;
pub mod error;
pub mod fees;
pub mod network;
pub mod params;
pub mod tx;

pub use amount::{amount_to_display, try_display_to_amount};
pub use error::CoreError;
pub use fees::{Fee, FeeParams};
pub use network::{NetworkParams, ParamShape, SighashScheme};
pub use params::ChainParams;
pub use tx::{OutPoint, ScriptVec, TransactionId, TransactionIntent, UnspentRecord};
