//! Flat-file persistence: two headerless CSV files in one data directory.
//! `accounts.csv` holds the directory snapshot, `transactions.csv` the
//! movement records. Unreadable lines are skipped with a warning on load
//! so one corrupt row never takes the whole ledger down.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::{
    Account, AccountId, AccountKind, AccountRecord, Snapshot, Store, StoreError, TxKind, TxRecord,
    money,
};

/// Timestamp layout inside `transactions.csv`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const ACCOUNTS_FILE: &str = "accounts.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";

/// Store over a data directory. The directory is created on first write;
/// a missing directory or file reads as empty.
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn accounts_path(&self) -> PathBuf {
        self.dir.join(ACCOUNTS_FILE)
    }

    fn transactions_path(&self) -> PathBuf {
        self.dir.join(TRANSACTIONS_FILE)
    }

    fn reader_for(path: &Path) -> Result<Option<csv::Reader<File>>, StoreError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);
        Ok(Some(reader))
    }

    fn writer_for(&self, path: &Path, append: bool) -> Result<csv::Writer<File>, StoreError> {
        fs::create_dir_all(&self.dir)?;
        let file = if append {
            OpenOptions::new().append(true).create(true).open(path)?
        } else {
            File::create(path)?
        };
        Ok(csv::WriterBuilder::new().flexible(true).from_writer(file))
    }
}

impl Store for CsvStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        let mut snapshot = Snapshot::default();

        if let Some(mut reader) = Self::reader_for(&self.accounts_path())? {
            for row in reader.records() {
                let row = match row {
                    Ok(row) => row,
                    Err(e) => {
                        warn!(error = %e, "unreadable account line skipped");
                        continue;
                    }
                };
                match parse_account_row(&row) {
                    Ok(record) => snapshot.accounts.push(record),
                    Err(e) => warn!(error = %e, "malformed account line skipped"),
                }
            }
        }

        if let Some(mut reader) = Self::reader_for(&self.transactions_path())? {
            for row in reader.records() {
                let row = match row {
                    Ok(row) => row,
                    Err(e) => {
                        warn!(error = %e, "unreadable transaction line skipped");
                        continue;
                    }
                };
                match parse_tx_row(&row) {
                    Ok(record) => snapshot.records.push(record),
                    Err(e) => warn!(error = %e, "malformed transaction line skipped"),
                }
            }
        }

        Ok(snapshot)
    }

    fn save_accounts(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let mut writer = self.writer_for(&self.accounts_path(), false)?;
        for account in accounts {
            writer.write_record(account_fields(&account.to_record()))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn append_record(&self, record: &TxRecord) -> Result<(), StoreError> {
        let mut writer = self.writer_for(&self.transactions_path(), true)?;
        writer.write_record(tx_fields(record))?;
        writer.flush()?;
        Ok(())
    }

    fn rewrite_records(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let mut writer = self.writer_for(&self.transactions_path(), false)?;
        for account in accounts {
            for record in account.log().all() {
                writer.write_record(tx_fields(record))?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

fn field<'a>(row: &'a csv::StringRecord, index: usize, what: &str) -> Result<&'a str, StoreError> {
    row.get(index)
        .ok_or_else(|| StoreError::Parse(format!("missing {what}")))
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::Parse(format!("bad {what}: {raw:?}")))
}

fn parse_amount(raw: &str, what: &str) -> Result<Decimal, StoreError> {
    money::parse(raw).ok_or_else(|| StoreError::Parse(format!("bad {what}: {raw:?}")))
}

fn parse_flag(raw: &str) -> Result<bool, StoreError> {
    match raw {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(StoreError::Parse(format!("bad active flag: {other:?}"))),
    }
}

/// Account ids in transaction rows use `0` for "no account on this side".
fn parse_link(raw: &str) -> Result<Option<AccountId>, StoreError> {
    let id: AccountId = parse_number(raw, "account reference")?;
    Ok(if id == 0 { None } else { Some(id) })
}

fn parse_account_row(row: &csv::StringRecord) -> Result<AccountRecord, StoreError> {
    let id = parse_number(field(row, 0, "account id")?, "account id")?;
    let name = field(row, 1, "holder name")?.to_string();
    if name.is_empty() {
        return Err(StoreError::Parse("empty holder name".to_string()));
    }
    let balance = parse_amount(field(row, 2, "balance")?, "balance")?;
    let kind_tag = field(row, 3, "account kind")?;
    let kind = AccountKind::parse_tag(kind_tag)
        .ok_or_else(|| StoreError::Parse(format!("unknown account kind: {kind_tag:?}")))?;
    let active = parse_flag(field(row, 4, "active flag")?)?;
    let daily_limit = parse_amount(field(row, 5, "daily limit")?, "daily limit")?;
    let overdraft_ceiling = match row.get(6) {
        Some(raw) if !raw.is_empty() => Some(parse_amount(raw, "overdraft ceiling")?),
        _ => None,
    };

    Ok(AccountRecord {
        id,
        name,
        balance,
        kind,
        active,
        daily_limit,
        overdraft_ceiling,
    })
}

fn parse_tx_row(row: &csv::StringRecord) -> Result<TxRecord, StoreError> {
    let id = parse_number(field(row, 0, "record id")?, "record id")?;
    let kind_tag = field(row, 1, "record kind")?;
    let kind = TxKind::parse_tag(kind_tag)
        .ok_or_else(|| StoreError::Parse(format!("unknown record kind: {kind_tag:?}")))?;
    let amount = parse_amount(field(row, 2, "amount")?, "amount")?;
    if amount <= Decimal::ZERO {
        return Err(StoreError::Parse(format!("non-positive amount: {amount}")));
    }
    let raw_ts = field(row, 3, "timestamp")?;
    let timestamp = NaiveDateTime::parse_from_str(raw_ts, TIMESTAMP_FORMAT)
        .map_err(|e| StoreError::Parse(format!("bad timestamp {raw_ts:?}: {e}")))?;
    let description = field(row, 4, "description")?.to_string();
    let source = parse_link(field(row, 5, "source account")?)?;
    let target = parse_link(field(row, 6, "target account")?)?;

    Ok(TxRecord::new(
        id, kind, amount, timestamp, description, source, target,
    ))
}

fn account_fields(record: &AccountRecord) -> Vec<String> {
    let mut fields = vec![
        record.id.to_string(),
        record.name.clone(),
        record.balance.to_string(),
        record.kind.as_str().to_string(),
        if record.active { "1" } else { "0" }.to_string(),
        record.daily_limit.to_string(),
    ];
    if let Some(ceiling) = record.overdraft_ceiling {
        fields.push(ceiling.to_string());
    }
    fields
}

fn tx_fields(record: &TxRecord) -> [String; 7] {
    [
        record.id().to_string(),
        record.kind().as_str().to_string(),
        record.amount().to_string(),
        record.timestamp().format(TIMESTAMP_FORMAT).to_string(),
        record.description().to_string(),
        record.source().unwrap_or(0).to_string(),
        record.target().unwrap_or(0).to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::TxSeq;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap()
    }

    fn dec(raw: &str) -> Decimal {
        money::parse(raw).unwrap()
    }

    fn sample_accounts() -> Vec<Account> {
        let mut seq = TxSeq::new();
        let mut alice = Account::new(10001, "Alice".to_string(), AccountKind::Standard, ts().date());
        let mut bob = Account::new(10002, "Doe, Bob".to_string(), AccountKind::Overdraft, ts().date());

        alice.deposit(dec("100"), &mut seq, ts(), "Initial deposit").unwrap();
        alice.withdraw(dec("25.50"), &mut seq, ts()).unwrap();
        alice.transfer(&mut bob, dec("30"), &mut seq, ts()).unwrap();
        vec![alice, bob]
    }

    #[test]
    fn missing_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("nothing-here"));
        let snapshot = store.load().unwrap();
        assert!(snapshot.accounts.is_empty());
        assert!(snapshot.records.is_empty());
    }

    #[test]
    fn accounts_and_records_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path());
        let accounts = sample_accounts();

        store.save_accounts(&accounts).unwrap();
        store.rewrite_records(&accounts).unwrap();

        let snapshot = store.load().unwrap();
        let expected: Vec<AccountRecord> = accounts.iter().map(|a| a.to_record()).collect();
        assert_eq!(snapshot.accounts, expected);

        let expected_records: Vec<TxRecord> = accounts
            .iter()
            .flat_map(|a| a.log().all().iter().cloned())
            .collect();
        assert_eq!(snapshot.records, expected_records);
    }

    #[test]
    fn quoted_names_survive_the_codec() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path());
        let accounts = sample_accounts();

        store.save_accounts(&accounts).unwrap();
        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.accounts[1].name, "Doe, Bob");
    }

    #[test]
    fn append_adds_without_rewriting() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path());
        let accounts = sample_accounts();
        let records: Vec<TxRecord> = accounts[0].log().all().to_vec();

        for record in &records {
            store.append_record(record).unwrap();
        }
        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.records, records);
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path());

        fs::write(
            store.accounts_path(),
            "10001,Alice,100.00,standard,1,5000.00\n\
             not-an-id,Bob,1.00,standard,1,5000.00\n\
             10003,Carol,7.00,savings,1,5000.00\n\
             10004,Dan,50.00,overdraft,0,5000.00,2000.00\n",
        )
        .unwrap();
        fs::write(
            store.transactions_path(),
            "1001,deposit,100.00,2024-03-01 14:30:05,Initial deposit,0,10001\n\
             1002,deposit,1.00,yesterday,,0,10001\n\
             1003,mystery,1.00,2024-03-01 14:30:05,,0,10001\n",
        )
        .unwrap();

        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.accounts.len(), 2);
        assert_eq!(snapshot.accounts[0].id, 10001);
        assert_eq!(snapshot.accounts[1].id, 10004);
        assert_eq!(snapshot.accounts[1].overdraft_ceiling, Some(dec("2000")));
        assert!(!snapshot.accounts[1].active);

        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].id(), 1001);
    }

    #[test]
    fn non_positive_amounts_are_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path());

        fs::write(
            store.transactions_path(),
            "1001,deposit,100.00,2024-03-01 14:30:05,,0,10001\n\
             1002,withdrawal,0.00,2024-03-01 14:30:05,,10001,0\n\
             1003,deposit,-5.00,2024-03-01 14:30:05,,0,10001\n",
        )
        .unwrap();

        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].id(), 1001);
    }

    #[test]
    fn standard_rows_omit_the_ceiling_field() {
        let accounts = sample_accounts();
        assert_eq!(account_fields(&accounts[0].to_record()).len(), 6);
        assert_eq!(account_fields(&accounts[1].to_record()).len(), 7);
    }

    #[test]
    fn transfer_rows_keep_both_references() {
        let accounts = sample_accounts();
        let out = accounts[0].log().all().last().unwrap();
        let fields = tx_fields(out);
        assert_eq!(fields[1], "transfer_out");
        assert_eq!(fields[5], "10001");
        assert_eq!(fields[6], "10002");

        let deposit = &accounts[0].log().all()[0];
        assert_eq!(tx_fields(deposit)[5], "0");
    }
}
