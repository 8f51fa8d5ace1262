pub mod account;
pub mod error;
pub mod kind;
pub mod money;
pub mod traits;
pub mod transaction;

/// Account ids are issued above [`crate::ledger::ACCOUNT_ID_BASE`] and
/// never reused within one data directory.
pub type AccountId = u32;

/// Transaction record ids, monotonic across all accounts.
pub type TxId = u64;

pub use account::{Account, AccountRecord, DEFAULT_DAILY_LIMIT, DEFAULT_OVERDRAFT_CEILING};
pub use error::{LedgerError, StoreError};
pub use kind::AccountKind;
pub use traits::{Clock, Snapshot, Store};
pub use transaction::{TransactionLog, TxKind, TxRecord};
