use thiserror::Error;

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum CoreError {
    #[error("Invalid transaction id {0}")]
    InvalidTransactionId(String),

    #[error("Invalid amount {0}")]
    InvalidAmount(String),

    #[error("Amount overflows the base denomination")]
    AmountOverflow,
}
