//! Signature normalization and serialization.
//!
//! ECDSA signatures over secp256k1 are normalized to the low-S canonical
//! form consensus policy demands; Ed25519 signatures have no malleable
//! representation and pass through untouched. Encoding targets the exact
//! byte layout a chain's transaction format embeds.

use secp256k1::ecdsa;
use thiserror::Error;

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum SignatureError {
    #[error("Secp256k1 -> {0}")]
    Secp256k1(#[from] secp256k1::Error),

    #[error("Signature curve does not match the public key curve")]
    CurveMismatch,

    #[error("Invalid signature length {0}")]
    BadLength(usize),

    #[error("Ed25519 signatures have a single fixed-width encoding")]
    UnsupportedEncoding,
}

/// An external signer's public key.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum PublicKey {
    Secp256k1(secp256k1::PublicKey),
    Ed25519([u8; 32]),
}

impl PublicKey {
    pub fn from_secp256k1_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        Ok(PublicKey::Secp256k1(secp256k1::PublicKey::from_slice(bytes)?))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PublicKey::Secp256k1(pk) => pk.serialize().to_vec(),
            PublicKey::Ed25519(bytes) => bytes.to_vec(),
        }
    }
}

/// A raw signature produced by an external signer.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Signature {
    Ecdsa(ecdsa::Signature),
    Ed25519([u8; 64]),
}

/// Target byte layouts for [`encode`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SignatureFormat {
    /// Fixed-width `r || s` (ECDSA compact) or the native 64-byte Ed25519 form.
    RawFixed,
    /// ASN.1 DER, as legacy UTXO script signatures embed.
    Der,
    /// DER with the sighash-type byte appended, the form pushed into
    /// unlocking scripts and witness stacks.
    DerWithHashType(u8),
}

impl Signature {
    /// Builds an ECDSA signature from a fixed-width `r || s` pair.
    pub fn from_ecdsa_raw(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != 64 {
            return Err(SignatureError::BadLength(bytes.len()));
        }
        Ok(Signature::Ecdsa(ecdsa::Signature::from_compact(bytes)?))
    }

    pub fn from_ed25519_raw(bytes: &[u8]) -> Result<Self, SignatureError> {
        let bytes: [u8; 64] = bytes.try_into().map_err(|_| SignatureError::BadLength(bytes.len()))?;
        Ok(Signature::Ed25519(bytes))
    }

    /// True when the signature's curve matches the public key's curve.
    pub fn matches_key(&self, public_key: &PublicKey) -> bool {
        matches!(
            (self, public_key),
            (Signature::Ecdsa(_), PublicKey::Secp256k1(_)) | (Signature::Ed25519(_), PublicKey::Ed25519(_))
        )
    }
}

/// Enforces the canonical form for the signature's curve: low-S for ECDSA
/// (`s > order/2` is replaced by `order - s`), identity for Ed25519.
pub fn normalize(signature: Signature) -> Signature {
    match signature {
        Signature::Ecdsa(mut sig) => {
            sig.normalize_s();
            Signature::Ecdsa(sig)
        }
        Signature::Ed25519(sig) => Signature::Ed25519(sig),
    }
}

/// Serializes a signature to the requested layout. The signature is
/// expected to already be normalized; callers embedding into transactions
/// go through [`normalize`] first.
pub fn encode(signature: &Signature, format: SignatureFormat) -> Result<Vec<u8>, SignatureError> {
    match (signature, format) {
        (Signature::Ecdsa(sig), SignatureFormat::RawFixed) => Ok(sig.serialize_compact().to_vec()),
        (Signature::Ecdsa(sig), SignatureFormat::Der) => Ok(sig.serialize_der().to_vec()),
        (Signature::Ecdsa(sig), SignatureFormat::DerWithHashType(hash_type)) => {
            let mut bytes = sig.serialize_der().to_vec();
            bytes.push(hash_type);
            Ok(bytes)
        }
        (Signature::Ed25519(sig), SignatureFormat::RawFixed) => Ok(sig.to_vec()),
        (Signature::Ed25519(_), _) => Err(SignatureError::UnsupportedEncoding),
    }
}

/// Checks that a signature may be embedded for the given key, returning the
/// normalized form. Curve mismatch is a hard error, never a coercion.
pub fn normalize_for_key(signature: Signature, public_key: &PublicKey) -> Result<Signature, SignatureError> {
    if !signature.matches_key(public_key) {
        return Err(SignatureError::CurveMismatch);
    }
    Ok(normalize(signature))
}
