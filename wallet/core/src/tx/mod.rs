//! The two-phase transaction builder contract and its chain-shaped
//! implementations.
//!
//! `build_for_sign` is a pure function of `(intent, ledger snapshot,
//! network params)` producing ordered digests plus an opaque
//! [`SigningContext`]; `build_for_send` is a pure function of `(intent,
//! context, signatures)` producing final bytes. The caller owns the
//! context between the two calls.

pub mod cbor;
pub mod fees;
pub mod native;
pub mod reference;
pub mod remote_call;
pub mod request;
pub mod utxo_builder;

pub use remote_call::{RemoteCallBuilder, RemoteCallParams};
pub use utxo_builder::{UtxoBackend, UtxoTransactionBuilder};

use crate::error::Error;
use crate::result::Result;
use chainforge_core::network::ParamShape;
use chainforge_core::params::{check_params, ChainParams, ParamCheck};
use chainforge_core::tx::TransactionIntent;
use chainforge_signature::{normalize_for_key, PublicKey, Signature};

/// A 32-byte digest handed to the external signer.
pub type SigningDigest = [u8; 32];

/// The product of `build_for_sign`: one digest per thing to sign, in the
/// order the external signer must process them, plus the opaque state the
/// caller hands back to `build_for_send`.
#[derive(Debug, Clone)]
pub struct SigningPackage {
    pub digests: Vec<SigningDigest>,
    pub context: SigningContext,
}

/// Opaque inter-phase state. Each builder family has its own variant;
/// handing a context to a builder of the other family is an error, never
/// a reinterpretation.
#[derive(Debug, Clone)]
pub enum SigningContext {
    Utxo(utxo_builder::UtxoSigningContext),
    RemoteCall(remote_call::RemoteCallSigningContext),
}

/// One signer response: the digest it answers, the signature over it, and
/// the public key the signature verifies under.
#[derive(Debug, Clone)]
pub struct SignatureResult {
    pub digest: SigningDigest,
    pub signature: Signature,
    pub public_key: PublicKey,
}

impl SignatureResult {
    pub fn new(digest: SigningDigest, signature: Signature, public_key: PublicKey) -> Self {
        Self { digest, signature, public_key }
    }
}

/// The finished, broadcast-ready artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltTransaction {
    /// Raw transaction bytes for UTXO-style chains, hex-encoded for
    /// transport.
    Raw(Vec<u8>),
    /// The envelope pair for remote-call chains. The caller submits `call`
    /// first and polls with `read_state`.
    Envelopes { call: Vec<u8>, read_state: Vec<u8> },
}

impl BuiltTransaction {
    /// Transport encoding of a raw transaction. `None` for envelope pairs,
    /// which are submitted as binary bodies rather than hex strings.
    pub fn to_hex(&self) -> Option<String> {
        match self {
            BuiltTransaction::Raw(bytes) => Some(hex::encode(bytes)),
            BuiltTransaction::Envelopes { .. } => None,
        }
    }
}

/// The contract every chain builder implements. Builders hold no mutable
/// state; both phases may be retried or abandoned freely.
pub trait TransactionBuilder {
    fn build_for_sign(&self, intent: &TransactionIntent) -> Result<SigningPackage>;

    fn build_for_send(
        &self,
        intent: &TransactionIntent,
        context: SigningContext,
        signatures: &[SignatureResult],
    ) -> Result<BuiltTransaction>;
}

/// Maps the uniform param-shape check onto the builder error taxonomy.
/// Invoked at the top of every `build_for_sign`.
pub(crate) fn ensure_params(chain: &str, shape: ParamShape, params: Option<&ChainParams>) -> Result<()> {
    match check_params(shape, params) {
        ParamCheck::Ok => Ok(()),
        ParamCheck::Unsupported { supplied } => {
            Err(Error::UnsupportedFeature(format!("{supplied:?} parameters cannot be expressed on {chain}")))
        }
        ParamCheck::Malformed { expected, reason } => Err(Error::MalformedParams { expected, reason }),
    }
}

/// Validates the positional pairing of signer responses against the
/// digests requested by `build_for_sign`, returning each signature in its
/// canonical form. Count mismatch and per-position digest mismatch are
/// hard errors; nothing is reordered on the caller's behalf.
pub(crate) fn validate_pairing(
    digests: &[SigningDigest],
    signatures: &[SignatureResult],
) -> Result<Vec<(Signature, PublicKey)>> {
    if signatures.len() != digests.len() {
        return Err(Error::SignatureCountMismatch { expected: digests.len(), actual: signatures.len() });
    }
    let mut paired = Vec::with_capacity(signatures.len());
    for (index, (digest, result)) in digests.iter().zip(signatures.iter()).enumerate() {
        if &result.digest != digest {
            return Err(Error::SignatureMismatch { index });
        }
        let signature = normalize_for_key(result.signature, &result.public_key)?;
        paired.push((signature, result.public_key));
    }
    Ok(paired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn secp_pair(digest_byte: u8) -> SignatureResult {
        let key = PublicKey::from_secp256k1_bytes(&hex!(
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        ))
        .unwrap();
        let sig = Signature::from_ecdsa_raw(&hex!(
            "0000000000000000000000000000000000000000000000000000000000000002"
            "0000000000000000000000000000000000000000000000000000000000000003"
        ))
        .unwrap();
        SignatureResult::new([digest_byte; 32], sig, key)
    }

    #[test]
    fn test_pairing_count_mismatch() {
        let digests = [[1u8; 32], [2u8; 32]];
        let err = validate_pairing(&digests, &[secp_pair(1)]).unwrap_err();
        assert_eq!(err, Error::SignatureCountMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn test_pairing_order_swap_is_rejected() {
        let digests = [[1u8; 32], [2u8; 32]];
        assert!(validate_pairing(&digests, &[secp_pair(1), secp_pair(2)]).is_ok());
        // swapped responses fail at the first out-of-place position
        let err = validate_pairing(&digests, &[secp_pair(2), secp_pair(1)]).unwrap_err();
        assert_eq!(err, Error::SignatureMismatch { index: 0 });
    }

    #[test]
    fn test_pairing_rejects_curve_mismatch() {
        let digests = [[1u8; 32]];
        let mut result = secp_pair(1);
        result.public_key = PublicKey::Ed25519([9u8; 32]);
        assert_eq!(
            validate_pairing(&digests, &[result]).unwrap_err(),
            Error::Signature(chainforge_signature::SignatureError::CurveMismatch)
        );
    }
}
