use std::env;
use std::error::Error;
use std::fs::File;
use std::io;

use futures::StreamExt;
use tracing::{info, warn};

use bank_ledger::ingestion::{Op, OpReader, OpSource};
use bank_ledger::{Clock, CsvStore, Ledger, Store, SystemClock};

/// Batch driver: reload the ledger from the data directory, apply an
/// optional operations file row by row, then print the account summary
/// to stdout. Rejected or unreadable rows are logged and skipped; the
/// run carries on.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to stderr; stdout is reserved for the summary.
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let mut args = env::args().skip(1);
    let Some(data_dir) = args.next() else {
        return Err("usage: bank_ledger <data-dir> [operations.csv]".into());
    };
    let ops_path = args.next();

    let store = CsvStore::new(&data_dir);
    let mut ledger = Ledger::open(store, SystemClock)?;
    info!(data_dir = %data_dir, accounts = ledger.accounts().count(), "ledger loaded");

    if let Some(path) = ops_path {
        let file = File::open(&path)?;
        let mut reader = OpReader::new(file);
        let mut ops = reader.stream();
        while let Some(op) = ops.next().await {
            match op {
                Ok(op) => apply(&mut ledger, op),
                Err(e) => warn!(error = %e, "skipping unreadable operation row"),
            }
        }
    }

    print_summary(&ledger)?;
    Ok(())
}

fn apply<S: Store, C: Clock>(ledger: &mut Ledger<S, C>, op: Op) {
    let result = match op {
        Op::Open {
            name,
            kind,
            initial,
        } => ledger.create_account(&name, kind, initial),
        Op::Deposit { account, amount } => ledger.deposit(account, amount),
        Op::Withdraw { account, amount } => ledger.withdraw(account, amount),
        Op::Transfer { from, to, amount } => ledger.transfer(from, to, amount),
        Op::Block { account } => ledger.block_account(account),
        Op::Unblock { account } => ledger.unblock_account(account),
        Op::Delete { account } => ledger.delete_account(account),
        Op::Rename { account, name } => ledger.rename_account(account, &name),
        Op::SetLimit { account, limit } => ledger.set_daily_limit(account, limit),
        Op::SetCeiling { account, ceiling } => ledger.set_overdraft_ceiling(account, ceiling),
    };

    match result {
        Ok(receipt) => {
            info!(account = receipt.account, balance = %receipt.balance, "applied");
            if let Some(e) = receipt.warning {
                warn!(error = %e, "state change not fully persisted");
            }
        }
        Err(e) => warn!(error = %e, "operation rejected"),
    }
}

fn print_summary<S: Store, C: Clock>(ledger: &Ledger<S, C>) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["id", "name", "balance", "kind", "active", "daily_limit"])?;
    for account in ledger.accounts() {
        writer.write_record([
            account.id().to_string(),
            account.name().to_string(),
            account.balance().to_string(),
            account.kind().as_str().to_string(),
            if account.is_active() { "1" } else { "0" }.to_string(),
            account.daily_limit().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
