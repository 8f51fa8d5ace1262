//! The account directory and every operation the bank exposes. One
//! `Ledger` owns all accounts, the id counters and the storage handle;
//! callers go through its methods and get a [`Receipt`] or a
//! [`LedgerError`] back.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::{
    Account, AccountId, AccountKind, Clock, LedgerError, Store, StoreError,
    money,
    transaction::{TxRecord, TxSeq},
};

/// Account ids are issued above this base; the first ever is 10001.
pub const ACCOUNT_ID_BASE: AccountId = 10_000;

/// Outcome of a mutating operation. `warning` carries a persistence
/// failure from the best-effort write that followed the state change;
/// the in-memory change stands either way.
#[derive(Debug)]
pub struct Receipt {
    pub account: AccountId,
    pub balance: Decimal,
    pub warning: Option<StoreError>,
}

/// Single-threaded by construction: every operation takes `&mut self`
/// and runs to completion. Concurrent use needs per-account locking
/// (transfers acquiring in ascending id order) plus a directory lock
/// around create, delete and iteration, and is out of scope here.
#[derive(Debug)]
pub struct Ledger<S, C> {
    accounts: Vec<Account>,
    last_account_id: AccountId,
    tx_seq: TxSeq,
    store: S,
    clock: C,
}

impl<S: Store, C: Clock> Ledger<S, C> {
    /// Rebuild the directory from whatever the store holds. An empty
    /// store yields an empty, usable ledger. Both id counters are seeded
    /// past everything the snapshot mentions, including account ids that
    /// only survive as transfer references, so nothing is ever reissued.
    pub fn open(store: S, clock: C) -> Result<Self, LedgerError> {
        let snapshot = store.load()?;
        let today = clock.today();

        let mut last_account_id = ACCOUNT_ID_BASE;
        let mut tx_seq = TxSeq::new();
        let mut accounts: Vec<Account> = Vec::with_capacity(snapshot.accounts.len());

        for record in snapshot.accounts {
            if accounts.iter().any(|a| a.id() == record.id) {
                warn!(id = record.id, "duplicate account record skipped");
                continue;
            }
            last_account_id = last_account_id.max(record.id);
            accounts.push(Account::from_record(record, today));
        }

        let mut by_owner: HashMap<AccountId, Vec<TxRecord>> = HashMap::new();
        for record in snapshot.records {
            tx_seq.observe(record.id());
            if let Some(id) = record.source() {
                last_account_id = last_account_id.max(id);
            }
            if let Some(id) = record.target() {
                last_account_id = last_account_id.max(id);
            }
            match record.owner() {
                Some(owner) if accounts.iter().any(|a| a.id() == owner) => {
                    by_owner.entry(owner).or_default().push(record);
                }
                _ => warn!(id = record.id(), "transaction record without an owner skipped"),
            }
        }
        for account in &mut accounts {
            if let Some(records) = by_owner.remove(&account.id()) {
                account.load_log(records);
            }
        }

        Ok(Self {
            accounts,
            last_account_id,
            tx_seq,
            store,
            clock,
        })
    }

    /// Open a new account, depositing `initial` if it is positive. A zero
    /// initial balance is fine and writes no record.
    pub fn create_account(
        &mut self,
        name: &str,
        kind: AccountKind,
        initial: Decimal,
    ) -> Result<Receipt, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidName);
        }
        let initial = money::normalize(initial);
        if initial < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount { amount: initial });
        }

        let now = self.clock.now();
        let id = self
            .last_account_id
            .checked_add(1)
            .ok_or(LedgerError::IdsExhausted)?;
        self.last_account_id = id;
        let mut account = Account::new(id, name.to_string(), kind, now.date());

        let mut opening = None;
        if initial > Decimal::ZERO {
            opening = Some(account.deposit(initial, &mut self.tx_seq, now, "Initial deposit")?);
        }
        let balance = account.balance();
        self.accounts.push(account);

        let warning = match &opening {
            Some(record) => self.persist_mutation(&[record]),
            None => self.persist_mutation(&[]),
        };
        Ok(Receipt {
            account: id,
            balance,
            warning,
        })
    }

    pub fn deposit(&mut self, id: AccountId, amount: Decimal) -> Result<Receipt, LedgerError> {
        let amount = money::normalize(amount);
        let now = self.clock.now();
        let account = find_mut(&mut self.accounts, id)?;
        let record = account.deposit(amount, &mut self.tx_seq, now, "")?;
        let balance = account.balance();

        let warning = self.persist_mutation(&[&record]);
        Ok(Receipt {
            account: id,
            balance,
            warning,
        })
    }

    pub fn withdraw(&mut self, id: AccountId, amount: Decimal) -> Result<Receipt, LedgerError> {
        let amount = money::normalize(amount);
        let now = self.clock.now();
        let account = find_mut(&mut self.accounts, id)?;
        let record = account.withdraw(amount, &mut self.tx_seq, now)?;
        let balance = account.balance();

        let warning = self.persist_mutation(&[&record]);
        Ok(Receipt {
            account: id,
            balance,
            warning,
        })
    }

    /// Move funds between two distinct accounts. Failure is atomic: a
    /// rejected transfer moves neither balance, neither log, and leaves
    /// the daily tally alone.
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<Receipt, LedgerError> {
        if from == to {
            return Err(LedgerError::SameAccount);
        }
        let amount = money::normalize(amount);
        let now = self.clock.now();

        let from_index = self.index_of(from)?;
        let to_index = self.index_of(to)?;
        let (source, target) = pair_mut(&mut self.accounts, from_index, to_index);
        let (out, incoming) = source.transfer(target, amount, &mut self.tx_seq, now)?;
        let balance = source.balance();

        let warning = self.persist_mutation(&[&out, &incoming]);
        Ok(Receipt {
            account: from,
            balance,
            warning,
        })
    }

    /// Remove an account outright. Its records leave the transaction file
    /// with it; the id is never reissued within this session, and on
    /// later loads the counters still skip it as long as any surviving
    /// transfer leg references it.
    pub fn delete_account(&mut self, id: AccountId) -> Result<Receipt, LedgerError> {
        let index = self.index_of(id)?;
        let removed = self.accounts.remove(index);

        let rewrite = self.store.rewrite_records(&self.accounts).err();
        let save = self.store.save_accounts(&self.accounts).err();
        Ok(Receipt {
            account: id,
            balance: removed.balance(),
            warning: rewrite.or(save),
        })
    }

    pub fn block_account(&mut self, id: AccountId) -> Result<Receipt, LedgerError> {
        self.with_account(id, |account| {
            account.block();
            Ok(())
        })
    }

    pub fn unblock_account(&mut self, id: AccountId) -> Result<Receipt, LedgerError> {
        self.with_account(id, |account| {
            account.unblock();
            Ok(())
        })
    }

    pub fn rename_account(&mut self, id: AccountId, name: &str) -> Result<Receipt, LedgerError> {
        self.with_account(id, |account| account.rename(name))
    }

    pub fn set_daily_limit(&mut self, id: AccountId, limit: Decimal) -> Result<Receipt, LedgerError> {
        let limit = money::normalize(limit);
        self.with_account(id, move |account| account.set_daily_limit(limit))
    }

    pub fn set_overdraft_ceiling(
        &mut self,
        id: AccountId,
        ceiling: Decimal,
    ) -> Result<Receipt, LedgerError> {
        let ceiling = money::normalize(ceiling);
        self.with_account(id, move |account| account.set_overdraft_ceiling(ceiling))
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id() == id)
    }

    /// Every account in insertion order, deletions closing the gap.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> + '_ {
        self.accounts.iter()
    }

    fn index_of(&self, id: AccountId) -> Result<usize, LedgerError> {
        self.accounts
            .iter()
            .position(|a| a.id() == id)
            .ok_or(LedgerError::NotFound(id))
    }

    fn with_account(
        &mut self,
        id: AccountId,
        apply: impl FnOnce(&mut Account) -> Result<(), LedgerError>,
    ) -> Result<Receipt, LedgerError> {
        let account = find_mut(&mut self.accounts, id)?;
        apply(account)?;
        let balance = account.balance();

        let warning = self.persist_mutation(&[]);
        Ok(Receipt {
            account: id,
            balance,
            warning,
        })
    }

    /// Best-effort write-through after a successful mutation: append the
    /// new records, then snapshot the accounts. Every write is attempted;
    /// the first failure is kept for the receipt.
    fn persist_mutation(&self, records: &[&TxRecord]) -> Option<StoreError> {
        let mut warning = None;
        for record in records {
            if let Err(e) = self.store.append_record(record) {
                warning.get_or_insert(e);
            }
        }
        if let Err(e) = self.store.save_accounts(&self.accounts) {
            warning.get_or_insert(e);
        }
        warning
    }
}

/// Borrows only the account list, leaving the id counters free.
fn find_mut(accounts: &mut [Account], id: AccountId) -> Result<&mut Account, LedgerError> {
    accounts
        .iter_mut()
        .find(|a| a.id() == id)
        .ok_or(LedgerError::NotFound(id))
}

/// Disjoint `&mut` borrows of two directory slots.
fn pair_mut(accounts: &mut [Account], i: usize, j: usize) -> (&mut Account, &mut Account) {
    debug_assert_ne!(i, j);
    if i < j {
        let (left, right) = accounts.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = accounts.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}
