use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::domain::{
    AccountId, LedgerError,
    kind::AccountKind,
    transaction::{TransactionLog, TxKind, TxRecord, TxSeq},
};

/// Per-calendar-day withdrawal allowance a new account starts with.
pub const DEFAULT_DAILY_LIMIT: Decimal = Decimal::from_parts(5_000_00, 0, 0, false, 2);

/// How far below zero an overdraft account may go by default.
pub const DEFAULT_OVERDRAFT_CEILING: Decimal = Decimal::from_parts(1_000_00, 0, 0, false, 2);

/// One bank account: balance, holder, status and its own append-only
/// transaction history. All mutation happens through the checked
/// operations below; a rejected operation changes nothing, including the
/// daily-limit tally.
///
/// Withdrawals and outgoing transfers share one daily tally against
/// `daily_limit`. The tally belongs to a single calendar day and resets
/// lazily: the first operation that consults or charges it on a later
/// date zeroes it first. Neither the tally nor its date is persisted, so
/// a restart also opens a fresh window.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    name: String,
    kind: AccountKind,
    balance: Decimal,
    active: bool,
    daily_limit: Decimal,
    daily_withdrawn: Decimal,
    window_day: NaiveDate,
    overdraft_ceiling: Decimal,
    log: TransactionLog,
}

impl Account {
    /// A fresh account with a zero balance. Name validation and the id
    /// allocation happen in the ledger before this runs.
    pub(crate) fn new(id: AccountId, name: String, kind: AccountKind, today: NaiveDate) -> Self {
        Self {
            id,
            name,
            kind,
            balance: Decimal::new(0, crate::domain::money::SCALE),
            active: true,
            daily_limit: DEFAULT_DAILY_LIMIT,
            daily_withdrawn: Decimal::ZERO,
            window_day: today,
            overdraft_ceiling: DEFAULT_OVERDRAFT_CEILING,
            log: TransactionLog::new(),
        }
    }

    /// Rebuild from a persisted record. The daily window starts fresh;
    /// the history is loaded separately once records are grouped.
    pub(crate) fn from_record(record: AccountRecord, today: NaiveDate) -> Self {
        Self {
            id: record.id,
            name: record.name,
            kind: record.kind,
            balance: record.balance,
            active: record.active,
            daily_limit: record.daily_limit,
            daily_withdrawn: Decimal::ZERO,
            window_day: today,
            overdraft_ceiling: record.overdraft_ceiling.unwrap_or(DEFAULT_OVERDRAFT_CEILING),
            log: TransactionLog::new(),
        }
    }

    pub(crate) fn to_record(&self) -> AccountRecord {
        AccountRecord {
            id: self.id,
            name: self.name.clone(),
            balance: self.balance,
            kind: self.kind,
            active: self.active,
            daily_limit: self.daily_limit,
            overdraft_ceiling: match self.kind {
                AccountKind::Overdraft => Some(self.overdraft_ceiling),
                AccountKind::Standard => None,
            },
        }
    }

    pub(crate) fn load_log(&mut self, records: Vec<TxRecord>) {
        self.log.replace(records);
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn daily_limit(&self) -> Decimal {
        self.daily_limit
    }

    /// Amount already charged against today's withdrawal window.
    pub fn daily_withdrawn(&self) -> Decimal {
        self.daily_withdrawn
    }

    pub fn overdraft_ceiling(&self) -> Decimal {
        self.overdraft_ceiling
    }

    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    /// Credit the account. `description` ends up verbatim on the record.
    pub(crate) fn deposit(
        &mut self,
        amount: Decimal,
        seq: &mut TxSeq,
        now: NaiveDateTime,
        description: &str,
    ) -> Result<TxRecord, LedgerError> {
        ensure_positive(amount)?;
        self.ensure_active()?;
        self.roll_window(now.date());

        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount { amount })?;
        let record = TxRecord::new(
            seq.alloc(),
            TxKind::Deposit,
            amount,
            now,
            description,
            None,
            Some(self.id),
        );
        self.log.append(record.clone());
        Ok(record)
    }

    /// Debit the account, charging today's withdrawal window.
    pub(crate) fn withdraw(
        &mut self,
        amount: Decimal,
        seq: &mut TxSeq,
        now: NaiveDateTime,
    ) -> Result<TxRecord, LedgerError> {
        ensure_positive(amount)?;
        self.ensure_active()?;
        self.roll_window(now.date());
        self.ensure_within_limit(amount)?;
        self.ensure_floor(amount)?;

        self.balance -= amount;
        self.daily_withdrawn += amount;
        let record = TxRecord::new(
            seq.alloc(),
            TxKind::Withdrawal,
            amount,
            now,
            "",
            Some(self.id),
            None,
        );
        self.log.append(record.clone());
        Ok(record)
    }

    /// Move funds to `target` atomically. The debit leg passes every
    /// withdrawal check (and charges the window); the credit leg is
    /// validated before either side changes, so a rejection moves
    /// nothing. Taking both accounts as `&mut` makes a self-transfer
    /// unrepresentable here; the ledger rejects it before the lookups.
    pub(crate) fn transfer(
        &mut self,
        target: &mut Account,
        amount: Decimal,
        seq: &mut TxSeq,
        now: NaiveDateTime,
    ) -> Result<(TxRecord, TxRecord), LedgerError> {
        ensure_positive(amount)?;
        self.ensure_active()?;
        if !target.active {
            return Err(LedgerError::ReceiverBlocked(target.id));
        }
        self.roll_window(now.date());
        self.ensure_within_limit(amount)?;
        self.ensure_floor(amount)?;
        let credited = target
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount { amount })?;

        self.balance -= amount;
        self.daily_withdrawn += amount;
        target.balance = credited;

        let out = TxRecord::new(
            seq.alloc(),
            TxKind::TransferOut,
            amount,
            now,
            "Online transfer",
            Some(self.id),
            Some(target.id),
        );
        let incoming = TxRecord::new(
            seq.alloc(),
            TxKind::TransferIn,
            amount,
            now,
            "Online transfer",
            Some(self.id),
            Some(target.id),
        );
        self.log.append(out.clone());
        target.log.append(incoming.clone());
        Ok((out, incoming))
    }

    pub(crate) fn block(&mut self) {
        self.active = false;
    }

    pub(crate) fn unblock(&mut self) {
        self.active = true;
    }

    pub(crate) fn rename(&mut self, name: &str) -> Result<(), LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidName);
        }
        self.name = name.to_string();
        Ok(())
    }

    /// Takes effect immediately; today's tally is kept, not re-checked.
    pub(crate) fn set_daily_limit(&mut self, limit: Decimal) -> Result<(), LedgerError> {
        if limit < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount { amount: limit });
        }
        self.daily_limit = limit;
        Ok(())
    }

    pub(crate) fn set_overdraft_ceiling(&mut self, ceiling: Decimal) -> Result<(), LedgerError> {
        if ceiling < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount { amount: ceiling });
        }
        self.overdraft_ceiling = ceiling;
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), LedgerError> {
        if !self.active {
            return Err(LedgerError::AccountBlocked(self.id));
        }
        Ok(())
    }

    fn ensure_within_limit(&self, amount: Decimal) -> Result<(), LedgerError> {
        // A tally too large to add up is over any representable limit.
        match self.daily_withdrawn.checked_add(amount) {
            Some(total) if total <= self.daily_limit => Ok(()),
            _ => Err(LedgerError::LimitExceeded {
                requested: amount,
                remaining: (self.daily_limit - self.daily_withdrawn).max(Decimal::ZERO),
            }),
        }
    }

    fn ensure_floor(&self, amount: Decimal) -> Result<(), LedgerError> {
        let floor = self.kind.withdrawal_floor(self.overdraft_ceiling);
        match self.balance.checked_sub(amount) {
            Some(post) if post >= floor => Ok(()),
            _ => Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: self.balance - floor,
            }),
        }
    }

    fn roll_window(&mut self, today: NaiveDate) {
        if today != self.window_day {
            self.daily_withdrawn = Decimal::ZERO;
            self.window_day = today;
        }
    }
}

/// Persisted shape of an account, daily window excluded. Field order
/// matches the on-disk record; the trailing ceiling is only written for
/// overdraft accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub id: AccountId,
    pub name: String,
    pub balance: Decimal,
    pub kind: AccountKind,
    pub active: bool,
    pub daily_limit: Decimal,
    pub overdraft_ceiling: Option<Decimal>,
}

fn ensure_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount { amount });
    }
    Ok(())
}
