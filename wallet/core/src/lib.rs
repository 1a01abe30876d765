//! Chainforge wallet engine.
//!
//! The engine turns a caller-assembled [`TransactionIntent`] into the exact
//! byte sequences an external signer must sign, and later splices the
//! returned signatures into a broadcast-ready transaction. Every builder
//! follows the same two-phase contract:
//!
//! ```text
//! Idle --build_for_sign(intent)--> AwaitingSignatures --build_for_send(sigs)--> Built
//! ```
//!
//! No mutable builder state spans the two phases; the opaque
//! [`tx::SigningContext`] returned by the first phase is the only carrier,
//! which is what makes retries safe and encoding backends comparable
//! byte-for-byte.
//!
//! [`TransactionIntent`]: chainforge_core::tx::TransactionIntent

pub mod error;
pub mod result;
pub mod tx;
pub mod utxo;

pub use error::Error;
pub use result::Result;
pub use tx::{
    BuiltTransaction, RemoteCallBuilder, RemoteCallParams, SignatureResult, SigningContext, SigningPackage,
    TransactionBuilder, UtxoBackend, UtxoTransactionBuilder,
};
pub use utxo::{Selection, UtxoLedger};
