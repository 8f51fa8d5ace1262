use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::domain::{AccountId, TxId};

/// Record ids start above this base; the first ever issued is 1001.
pub(crate) const TX_ID_BASE: TxId = 1_000;

/// What a completed movement was, seen from the account that owns the
/// record. A transfer produces two records, one `TransferOut` on the
/// source and one `TransferIn` on the target, sharing amount and
/// counterparty but not id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Deposit => "deposit",
            TxKind::Withdrawal => "withdrawal",
            TxKind::TransferOut => "transfer_out",
            TxKind::TransferIn => "transfer_in",
        }
    }

    pub fn parse_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "deposit" => Some(TxKind::Deposit),
            "withdrawal" => Some(TxKind::Withdrawal),
            "transfer_out" => Some(TxKind::TransferOut),
            "transfer_in" => Some(TxKind::TransferIn),
            _ => None,
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable fact of one completed movement. Built only after every check
/// on the owning account has passed, never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TxRecord {
    id: TxId,
    kind: TxKind,
    amount: Decimal,
    timestamp: NaiveDateTime,
    description: String,
    source: Option<AccountId>,
    target: Option<AccountId>,
}

impl TxRecord {
    pub(crate) fn new(
        id: TxId,
        kind: TxKind,
        amount: Decimal,
        timestamp: NaiveDateTime,
        description: impl Into<String>,
        source: Option<AccountId>,
        target: Option<AccountId>,
    ) -> Self {
        Self {
            id,
            kind,
            amount,
            timestamp,
            description: description.into(),
            source,
            target,
        }
    }

    pub fn id(&self) -> TxId {
        self.id
    }

    pub fn kind(&self) -> TxKind {
        self.kind
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source(&self) -> Option<AccountId> {
        self.source
    }

    pub fn target(&self) -> Option<AccountId> {
        self.target
    }

    /// The account whose log this record belongs to. Credits sit with the
    /// target, debits with the source.
    pub fn owner(&self) -> Option<AccountId> {
        match self.kind {
            TxKind::Deposit | TxKind::TransferIn => self.target,
            TxKind::Withdrawal | TxKind::TransferOut => self.source,
        }
    }

    /// The other side of a transfer, if this record has one.
    pub fn counterparty(&self) -> Option<AccountId> {
        match self.kind {
            TxKind::TransferOut => self.target,
            TxKind::TransferIn => self.source,
            TxKind::Deposit | TxKind::Withdrawal => None,
        }
    }
}

/// Append-only, insertion-ordered history owned by one account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionLog {
    records: Vec<TxRecord>,
}

impl TransactionLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, record: TxRecord) {
        self.records.push(record);
    }

    /// Bulk replacement used when rebuilding from storage.
    pub(crate) fn replace(&mut self, records: Vec<TxRecord>) {
        self.records = records;
    }

    /// Full history, oldest first.
    pub fn all(&self) -> &[TxRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Allocator for record ids: monotonic, never reused, shared by every
/// account in the ledger.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TxSeq {
    last: TxId,
}

impl TxSeq {
    pub(crate) fn new() -> Self {
        Self { last: TX_ID_BASE }
    }

    /// Note an id seen during reload so later allocations stay above it.
    pub(crate) fn observe(&mut self, id: TxId) {
        self.last = self.last.max(id);
    }

    /// Next id. Pinned at the top of the id space rather than wrapping.
    pub(crate) fn alloc(&mut self) -> TxId {
        self.last = self.last.saturating_add(1);
        self.last
    }
}
