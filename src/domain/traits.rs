use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::{
    account::{Account, AccountRecord},
    error::StoreError,
    transaction::TxRecord,
};

/// Source of "now" for record timestamps and the daily window. Swapped
/// for a hand-driven clock in tests that cross calendar days.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Everything a reload needs from disk, in file order and unvalidated
/// beyond field-level parsing.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub accounts: Vec<AccountRecord>,
    pub records: Vec<TxRecord>,
}

/// Durable storage seam for the ledger. Writes are best-effort: when one
/// fails the caller keeps the in-memory change and surfaces the error as
/// a warning on the receipt instead of rolling back.
pub trait Store {
    /// Read whatever is on disk. Missing files mean an empty snapshot,
    /// not an error.
    fn load(&self) -> Result<Snapshot, StoreError>;

    /// Replace the account file with the current directory state.
    fn save_accounts(&self, accounts: &[Account]) -> Result<(), StoreError>;

    /// Append one movement to the transaction file.
    fn append_record(&self, record: &TxRecord) -> Result<(), StoreError>;

    /// Rewrite the transaction file from the surviving accounts' logs,
    /// grouped per account in directory order.
    fn rewrite_records(&self, accounts: &[Account]) -> Result<(), StoreError>;
}
