//! A small file-backed banking ledger: accounts with per-account
//! transaction history, validated deposits, withdrawals and transfers
//! under a daily withdrawal limit, persisted as flat CSV records.
//!
//! All state lives in a [`ledger::Ledger`], which owns every
//! [`domain::Account`] and both id counters. Mutations return a
//! [`ledger::Receipt`] carrying the new balance, or a
//! [`domain::LedgerError`] explaining the rejection; a failed write to
//! the backing [`store::CsvStore`] is reported as a warning on the
//! receipt, never as a rollback.

pub mod clock;
pub mod domain;
pub mod ingestion;
pub mod ledger;
pub mod store;

pub use clock::{FixedClock, SystemClock};
pub use domain::{
    Account, AccountId, AccountKind, Clock, LedgerError, Store, StoreError, TxId, TxKind, TxRecord,
};
pub use ledger::{Ledger, Receipt};
pub use store::CsvStore;
