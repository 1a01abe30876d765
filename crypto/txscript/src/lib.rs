//! Locking-script construction and classification for UTXO-style chains.

pub mod opcodes;
pub mod script_builder;
pub mod standard;

mod error;

pub use error::TxScriptError;
pub use script_builder::{ScriptBuilder, ScriptBuilderError, ScriptBuilderResult};
pub use standard::{classify_script, locking_script, script_hash, ScriptClass};

/// Maximum number of bytes a script is allowed to occupy.
pub const MAX_SCRIPTS_SIZE: usize = 10_000;

/// Maximum number of bytes a single pushed element is allowed to occupy.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;
