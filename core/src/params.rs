use crate::network::ParamShape;
use serde::{Deserialize, Serialize};

/// Chain-specific per-transaction parameter. A chain declares the single
/// shape it accepts via [`ParamShape`]; everything else is rejected before
/// any encoding work starts.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub enum ChainParams {
    Memo(String),
    DestinationTag(u32),
    Nonce(u64),
}

impl ChainParams {
    pub fn shape(&self) -> ParamShape {
        match self {
            ChainParams::Memo(_) => ParamShape::Memo,
            ChainParams::DestinationTag(_) => ParamShape::DestinationTag,
            ChainParams::Nonce(_) => ParamShape::Nonce,
        }
    }
}

/// Outcome of matching a transaction's params against the chain's declared
/// shape. The caller maps these onto its own error taxonomy.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum ParamCheck {
    Ok,
    /// A param was supplied that the chain cannot express.
    Unsupported { supplied: ParamShape },
    /// The chain mandates a param that is absent or malformed.
    Malformed { expected: ParamShape, reason: &'static str },
}

/// Uniform shape check invoked at the top of every `build_for_sign`.
pub fn check_params(shape: ParamShape, params: Option<&ChainParams>) -> ParamCheck {
    match (shape, params) {
        (ParamShape::None, None) => ParamCheck::Ok,
        (ParamShape::None, Some(p)) => ParamCheck::Unsupported { supplied: p.shape() },
        (expected, None) => ParamCheck::Malformed { expected, reason: "required parameter is missing" },
        (expected, Some(p)) if p.shape() != expected => ParamCheck::Unsupported { supplied: p.shape() },
        (_, Some(ChainParams::Memo(text))) if text.is_empty() => {
            ParamCheck::Malformed { expected: ParamShape::Memo, reason: "memo must not be empty" }
        }
        (_, Some(_)) => ParamCheck::Ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_params() {
        assert_eq!(check_params(ParamShape::None, None), ParamCheck::Ok);
        assert_eq!(check_params(ParamShape::Nonce, Some(&ChainParams::Nonce(7))), ParamCheck::Ok);
        assert_eq!(check_params(ParamShape::Memo, Some(&ChainParams::Memo("hi".into()))), ParamCheck::Ok);

        assert_eq!(
            check_params(ParamShape::None, Some(&ChainParams::Memo("hi".into()))),
            ParamCheck::Unsupported { supplied: ParamShape::Memo }
        );
        assert_eq!(
            check_params(ParamShape::Nonce, Some(&ChainParams::DestinationTag(9))),
            ParamCheck::Unsupported { supplied: ParamShape::DestinationTag }
        );
        assert!(matches!(check_params(ParamShape::Nonce, None), ParamCheck::Malformed { expected: ParamShape::Nonce, .. }));
        assert!(matches!(
            check_params(ParamShape::Memo, Some(&ChainParams::Memo(String::new()))),
            ParamCheck::Malformed { expected: ParamShape::Memo, .. }
        ));
    }
}
