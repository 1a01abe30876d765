use chainforge_addresses::AddressError;
use thiserror::Error;

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum TxScriptError {
    #[error("Address {address}: {source}")]
    UnsupportedAddress {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error(transparent)]
    ScriptBuilder(#[from] crate::script_builder::ScriptBuilderError),
}
