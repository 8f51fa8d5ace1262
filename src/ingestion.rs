//! Batch input: a headered CSV of operations, exposed as a stream the
//! driver can drain row by row. Rows that fail to parse surface as
//! errors in the stream so the caller can skip them without losing the
//! rest of the file.

use std::io::Read;
use std::pin::Pin;

use futures::stream::{self, Stream};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{AccountId, AccountKind, StoreError, money};

/// One request against the ledger, already validated for shape (the
/// ledger still applies the business checks).
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Open {
        name: String,
        kind: AccountKind,
        initial: Decimal,
    },
    Deposit {
        account: AccountId,
        amount: Decimal,
    },
    Withdraw {
        account: AccountId,
        amount: Decimal,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    },
    Block {
        account: AccountId,
    },
    Unblock {
        account: AccountId,
    },
    Delete {
        account: AccountId,
    },
    Rename {
        account: AccountId,
        name: String,
    },
    SetLimit {
        account: AccountId,
        limit: Decimal,
    },
    SetCeiling {
        account: AccountId,
        ceiling: Decimal,
    },
}

/// Streaming source of batch operations.
pub trait OpSource {
    type Ops: Stream<Item = Result<Op, StoreError>> + Send + Unpin + 'static;

    fn stream(&mut self) -> Self::Ops;
}

/// Raw row shape: `op,account,target,amount,name,kind`, empty cells
/// reading as `None`. Which cells are required depends on the op.
#[derive(Debug, Deserialize)]
struct OpRow {
    op: String,
    account: Option<AccountId>,
    target: Option<AccountId>,
    amount: Option<Decimal>,
    name: Option<String>,
    kind: Option<String>,
}

impl TryFrom<OpRow> for Op {
    type Error = StoreError;

    fn try_from(row: OpRow) -> Result<Self, Self::Error> {
        fn need<T>(value: Option<T>, what: &str) -> Result<T, StoreError> {
            value.ok_or_else(|| StoreError::Parse(format!("missing {what}")))
        }

        let op = match row.op.trim().to_ascii_lowercase().as_str() {
            "open" => {
                let kind = match row.kind.as_deref() {
                    None | Some("") => AccountKind::Standard,
                    Some(tag) => AccountKind::parse_tag(tag)
                        .ok_or_else(|| StoreError::Parse(format!("unknown account kind: {tag:?}")))?,
                };
                Op::Open {
                    name: need(row.name, "holder name")?,
                    kind,
                    initial: money::normalize(row.amount.unwrap_or(Decimal::ZERO)),
                }
            }
            "deposit" => Op::Deposit {
                account: need(row.account, "account id")?,
                amount: money::normalize(need(row.amount, "amount")?),
            },
            "withdraw" => Op::Withdraw {
                account: need(row.account, "account id")?,
                amount: money::normalize(need(row.amount, "amount")?),
            },
            "transfer" => Op::Transfer {
                from: need(row.account, "account id")?,
                to: need(row.target, "target account id")?,
                amount: money::normalize(need(row.amount, "amount")?),
            },
            "block" => Op::Block {
                account: need(row.account, "account id")?,
            },
            "unblock" => Op::Unblock {
                account: need(row.account, "account id")?,
            },
            "delete" => Op::Delete {
                account: need(row.account, "account id")?,
            },
            "rename" => Op::Rename {
                account: need(row.account, "account id")?,
                name: need(row.name, "holder name")?,
            },
            "set_limit" => Op::SetLimit {
                account: need(row.account, "account id")?,
                limit: money::normalize(need(row.amount, "amount")?),
            },
            "set_ceiling" => Op::SetCeiling {
                account: need(row.account, "account id")?,
                ceiling: money::normalize(need(row.amount, "amount")?),
            },
            other => return Err(StoreError::Parse(format!("unknown operation: {other:?}"))),
        };
        Ok(op)
    }
}

/// CSV-backed [`OpSource`]. The underlying reader is consumed by the
/// first `stream` call; further calls yield an empty stream.
pub struct OpReader<R: Read> {
    reader: Option<csv::Reader<R>>,
}

impl<R: Read> OpReader<R> {
    pub fn new(reader: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self {
            reader: Some(reader),
        }
    }
}

impl<R: Read + Send + 'static> OpSource for OpReader<R> {
    type Ops = Pin<Box<dyn Stream<Item = Result<Op, StoreError>> + Send>>;

    fn stream(&mut self) -> Self::Ops {
        let Some(reader) = self.reader.take() else {
            return Box::pin(stream::iter(Vec::new()));
        };

        let rows = reader.into_deserialize::<OpRow>().map(|row| match row {
            Ok(row) => Op::try_from(row),
            Err(e) => Err(StoreError::Csv(e)),
        });
        Box::pin(stream::iter(rows))
    }
}
