use chainforge_addresses::AddressError;
use chainforge_core::error::CoreError;
use chainforge_core::network::ParamShape;
use chainforge_signature::SignatureError;
use chainforge_txscript::TxScriptError;
use thiserror::Error;

/// Funds shortfall detail. The two cases render differently upstream:
/// an empty ledger means "nothing known yet", a shortfall means "known
/// balance is too small".
#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum InsufficientFunds {
    #[error("no unspent records are known for {address}")]
    NoRecords { address: String },

    #[error("available {available} does not cover required {required} for {address}")]
    NotEnough { address: String, available: u64, required: u64 },
}

/// Terminal failure taxonomy of the engine. Nothing here is retried
/// internally and no partial transaction accompanies an error.
#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum Error {
    #[error(transparent)]
    InsufficientFunds(#[from] InsufficientFunds),

    #[error("Address {address}: {source}")]
    UnsupportedAddress {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("Expected {expected} signatures, received {actual}")]
    SignatureCountMismatch { expected: usize, actual: usize },

    #[error("Signature at position {index} does not correspond to the requested digest")]
    SignatureMismatch { index: usize },

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("Malformed chain parameters: expected {expected:?}: {reason}")]
    MalformedParams { expected: ParamShape, reason: &'static str },

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Encoding backend failure: {0}")]
    UnderlyingEncodingFailure(String),

    #[error("Ingress window expired at {expired_at}, current time {now}")]
    ExpiredFreshness { expired_at: u64, now: u64 },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    ScriptBuilder(#[from] chainforge_txscript::ScriptBuilderError),
}

impl From<TxScriptError> for Error {
    fn from(err: TxScriptError) -> Self {
        match err {
            TxScriptError::UnsupportedAddress { address, source } => Error::UnsupportedAddress { address, source },
            TxScriptError::ScriptBuilder(err) => Error::ScriptBuilder(err),
        }
    }
}
