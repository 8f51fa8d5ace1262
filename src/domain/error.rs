use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::AccountId;

/// Failure of the flat-file persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed record: {0}")]
    Parse(String),
}

/// Why a ledger operation was rejected. Every variant leaves the ledger
/// exactly as it was before the call.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("holder name must not be empty")]
    InvalidName,

    #[error("account {0} is blocked")]
    AccountBlocked(AccountId),

    #[error("receiving account {0} is blocked")]
    ReceiverBlocked(AccountId),

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    #[error("daily withdrawal limit exceeded: requested {requested}, {remaining} left today")]
    LimitExceeded {
        requested: Decimal,
        remaining: Decimal,
    },

    #[error("source and target account are the same")]
    SameAccount,

    #[error("account {0} not found")]
    NotFound(AccountId),

    #[error("no account ids left to allocate")]
    IdsExhausted,

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}
