//! Two-phase builder for remote-call chains.
//!
//! Instead of raw transaction bytes, `build_for_send` produces a pair of
//! envelopes: the call itself and the read-state request the caller later
//! polls with to confirm execution. Both are tied to the same nonce and
//! ingress expiry, so the pair is verifiably linked.
//!
//! The clock is injected. Wall time fixes the freshness window at
//! `build_for_sign`; if the window has already lapsed by the time
//! signatures arrive, `build_for_send` fails with `ExpiredFreshness`
//! rather than silently submitting stale timing data.

use crate::error::Error;
use crate::result::Result;
use crate::tx::cbor::Writer;
use crate::tx::request::{representation_hash, signing_digest, Value};
use crate::tx::{
    ensure_params, validate_pairing, BuiltTransaction, SignatureResult, SigningContext, SigningDigest, SigningPackage,
    TransactionBuilder,
};
use chainforge_addresses::AddressError;
use chainforge_core::fees::FeeParams;
use chainforge_core::network::ParamShape;
use chainforge_core::params::ChainParams;
use chainforge_core::tx::TransactionIntent;
use chainforge_signature::{encode, PublicKey, Signature, SignatureFormat};
use log::debug;
use sha2::{Digest, Sha224};
use std::sync::Arc;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Marker byte appended to a hashed public key to form a
/// self-authenticating sender principal.
const SELF_AUTHENTICATING: u8 = 0x02;

/// Time source returning nanoseconds since the Unix epoch. Injected so
/// tests can pin the freshness window.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Per-chain constants for a remote-call target.
#[derive(Debug, Clone)]
pub struct RemoteCallParams {
    pub name: &'static str,
    /// Ledger canister the transfer call is addressed to.
    pub canister_id: Vec<u8>,
    pub method_name: String,
    /// The sender's public key bytes, committed to by the sender
    /// principal inside both request maps.
    pub sender_public_key: Vec<u8>,
    /// Freshness window length in seconds.
    pub ingress_window_secs: u64,
}

/// Inter-phase state: both request maps plus the digests over them.
#[derive(Debug, Clone)]
pub struct RemoteCallSigningContext {
    call: Vec<(String, Value)>,
    read_state: Vec<(String, Value)>,
    digests: Vec<SigningDigest>,
    ingress_expiry: u64,
}

pub struct RemoteCallBuilder {
    params: RemoteCallParams,
    clock: Clock,
}

impl RemoteCallBuilder {
    pub fn new(params: RemoteCallParams, clock: Clock) -> Self {
        Self { params, clock }
    }

    /// Builder reading the system clock, the production configuration.
    pub fn with_system_clock(params: RemoteCallParams) -> Self {
        Self::new(
            params,
            Arc::new(|| {
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|elapsed| elapsed.as_nanos() as u64)
                    .unwrap_or_default()
            }),
        )
    }

    fn sender_principal(&self) -> Vec<u8> {
        let mut principal: Vec<u8> = Sha224::digest(&self.params.sender_public_key).to_vec();
        principal.push(SELF_AUTHENTICATING);
        principal
    }

    /// Destination account identifiers are 32 hex-encoded bytes.
    fn decode_destination(address: &str) -> Result<Vec<u8>> {
        let unsupported = |source| Error::UnsupportedAddress { address: address.to_string(), source };
        let bytes = hex::decode(address).map_err(|err| match err {
            hex::FromHexError::InvalidHexCharacter { c, .. } => unsupported(AddressError::DecodingError(c)),
            _ => unsupported(AddressError::BadLength(address.len())),
        })?;
        if bytes.len() != 32 {
            return Err(unsupported(AddressError::BadLength(bytes.len())));
        }
        Ok(bytes)
    }

    /// Transfer arguments, encoded as a deterministic CBOR map.
    fn encode_call_arg(intent: &TransactionIntent, nonce: u64, destination: Vec<u8>) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_value(&Value::Map(vec![
            ("amount".to_string(), Value::Nat(intent.amount)),
            ("fee".to_string(), Value::Nat(intent.fee.amount)),
            ("memo".to_string(), Value::Nat(nonce)),
            ("to".to_string(), Value::Bytes(destination)),
        ]));
        writer.into_bytes()
    }

    fn envelope(content: &[(String, Value)], public_key: &PublicKey, signature: &Signature) -> Result<Vec<u8>> {
        let mut writer = Writer::new();
        writer.self_describe().write_map_header(3);
        writer.write_text("content").write_value(&Value::Map(content.to_vec()));
        writer.write_text("sender_pubkey").write_bytes(&public_key.to_bytes());
        writer.write_text("sender_sig").write_bytes(&encode(signature, SignatureFormat::RawFixed)?);
        Ok(writer.into_bytes())
    }
}

impl TransactionBuilder for RemoteCallBuilder {
    fn build_for_sign(&self, intent: &TransactionIntent) -> Result<SigningPackage> {
        ensure_params(self.params.name, ParamShape::Nonce, intent.params.as_ref())?;
        if !matches!(intent.fee.params, FeeParams::Fixed) {
            return Err(Error::UnsupportedFeature(format!(
                "fee parameters {:?} cannot be expressed on {}",
                intent.fee.params, self.params.name
            )));
        }
        // shape was checked above
        let Some(&ChainParams::Nonce(nonce)) = intent.params.as_ref() else {
            return Err(Error::MalformedParams { expected: ParamShape::Nonce, reason: "required parameter is missing" });
        };

        let destination = Self::decode_destination(&intent.destination_address)?;
        let sender = self.sender_principal();
        let ingress_expiry = (self.clock)() + self.params.ingress_window_secs * NANOS_PER_SEC;

        let call = vec![
            ("arg".to_string(), Value::Bytes(Self::encode_call_arg(intent, nonce, destination))),
            ("canister_id".to_string(), Value::Bytes(self.params.canister_id.clone())),
            ("ingress_expiry".to_string(), Value::Nat(ingress_expiry)),
            ("method_name".to_string(), Value::Text(self.params.method_name.clone())),
            ("nonce".to_string(), Value::Bytes(nonce.to_be_bytes().to_vec())),
            ("request_type".to_string(), Value::Text("call".to_string())),
            ("sender".to_string(), Value::Bytes(sender.clone())),
        ];
        let request_id = representation_hash(&call);

        let read_state = vec![
            ("ingress_expiry".to_string(), Value::Nat(ingress_expiry)),
            (
                "paths".to_string(),
                Value::Array(vec![Value::Array(vec![
                    Value::Bytes(b"request_status".to_vec()),
                    Value::Bytes(request_id.to_vec()),
                ])]),
            ),
            ("request_type".to_string(), Value::Text("read_state".to_string())),
            ("sender".to_string(), Value::Bytes(sender)),
        ];

        let digests = vec![signing_digest(&request_id), signing_digest(&representation_hash(&read_state))];
        debug!("{}: call request {} expires at {}", self.params.name, hex::encode(request_id), ingress_expiry);

        Ok(SigningPackage {
            digests: digests.clone(),
            context: SigningContext::RemoteCall(RemoteCallSigningContext { call, read_state, digests, ingress_expiry }),
        })
    }

    fn build_for_send(
        &self,
        _intent: &TransactionIntent,
        context: SigningContext,
        signatures: &[SignatureResult],
    ) -> Result<BuiltTransaction> {
        let SigningContext::RemoteCall(context) = context else {
            return Err(Error::UnsupportedFeature(
                "signing context was produced by a different builder family".to_string(),
            ));
        };

        let now = (self.clock)();
        if now > context.ingress_expiry {
            return Err(Error::ExpiredFreshness { expired_at: context.ingress_expiry, now });
        }

        let paired = validate_pairing(&context.digests, signatures)?;
        let (call_sig, call_key) = &paired[0];
        let (read_sig, read_key) = &paired[1];

        Ok(BuiltTransaction::Envelopes {
            call: Self::envelope(&context.call, call_key, call_sig)?,
            read_state: Self::envelope(&context.read_state, read_key, read_sig)?,
        })
    }
}
