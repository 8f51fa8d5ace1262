//! End-to-end scenarios through the public API, each against its own
//! temporary data directory.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use bank_ledger::{AccountKind, CsvStore, FixedClock, Ledger, LedgerError};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn dec(raw: &str) -> Decimal {
    raw.parse().unwrap()
}

fn open_ledger(dir: &std::path::Path, clock: &FixedClock) -> Ledger<CsvStore, FixedClock> {
    Ledger::open(CsvStore::new(dir), clock.clone()).unwrap()
}

#[test]
fn standard_account_walkthrough() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at(start());
    let mut ledger = open_ledger(dir.path(), &clock);

    let alice = ledger
        .create_account("Alice", AccountKind::Standard, dec("100"))
        .unwrap()
        .account;
    let bob = ledger
        .create_account("Bob", AccountKind::Standard, dec("0"))
        .unwrap()
        .account;
    assert_eq!((alice, bob), (10001, 10002));

    ledger.withdraw(alice, dec("30")).unwrap();
    let receipt = ledger.transfer(alice, bob, dec("50")).unwrap();
    assert_eq!(receipt.balance, dec("20"));
    assert_eq!(ledger.account(bob).unwrap().balance(), dec("50"));
    assert_eq!(ledger.account(alice).unwrap().daily_withdrawn(), dec("80"));

    // The daily window has 4920.00 left; one cent over is refused.
    let err = ledger.withdraw(alice, dec("4920.01")).unwrap_err();
    assert!(matches!(err, LedgerError::LimitExceeded { .. }));

    ledger.withdraw(alice, dec("20")).unwrap();
    let err = ledger.withdraw(alice, dec("0.01")).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    assert_eq!(ledger.account(alice).unwrap().balance(), dec("0"));
}

#[test]
fn overdraft_account_walkthrough() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at(start());
    let mut ledger = open_ledger(dir.path(), &clock);

    let carol = ledger
        .create_account("Carol", AccountKind::Overdraft, dec("0"))
        .unwrap()
        .account;

    ledger.withdraw(carol, dec("600")).unwrap();
    assert_eq!(ledger.account(carol).unwrap().balance(), dec("-600"));

    let err = ledger.withdraw(carol, dec("400.01")).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

    ledger.set_overdraft_ceiling(carol, dec("2000")).unwrap();
    ledger.withdraw(carol, dec("1400")).unwrap();
    assert_eq!(ledger.account(carol).unwrap().balance(), dec("-2000"));
}

#[test]
fn lowering_the_limit_keeps_todays_tally() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at(start());
    let mut ledger = open_ledger(dir.path(), &clock);

    let alice = ledger
        .create_account("Alice", AccountKind::Standard, dec("100"))
        .unwrap()
        .account;
    ledger.withdraw(alice, dec("30")).unwrap();
    ledger.set_daily_limit(alice, dec("50")).unwrap();

    // 30 of the new 50 is already spent today; 40 more does not fit.
    let err = ledger.withdraw(alice, dec("40")).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::LimitExceeded { requested, remaining }
            if requested == dec("40") && remaining == dec("20")
    ));
    assert_eq!(ledger.account(alice).unwrap().balance(), dec("70"));
    assert_eq!(ledger.account(alice).unwrap().daily_withdrawn(), dec("30"));

    ledger.withdraw(alice, dec("20")).unwrap();
    assert_eq!(ledger.account(alice).unwrap().daily_withdrawn(), dec("50"));
}

#[test]
fn state_survives_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at(start());

    {
        let mut ledger = open_ledger(dir.path(), &clock);
        let alice = ledger
            .create_account("Alice", AccountKind::Standard, dec("100"))
            .unwrap()
            .account;
        let bob = ledger
            .create_account("Bob", AccountKind::Overdraft, dec("50"))
            .unwrap()
            .account;

        ledger.deposit(alice, dec("200")).unwrap();
        ledger.transfer(alice, bob, dec("75")).unwrap();
        ledger.withdraw(alice, dec("25")).unwrap();
        ledger.rename_account(alice, "Alice Cooper").unwrap();
        ledger.set_daily_limit(alice, dec("4000")).unwrap();
        ledger.block_account(bob).unwrap();
    }

    let mut reloaded = open_ledger(dir.path(), &clock);
    assert_eq!(reloaded.accounts().count(), 2);

    let alice = reloaded.account(10001).unwrap();
    assert_eq!(alice.name(), "Alice Cooper");
    assert_eq!(alice.balance(), dec("200"));
    assert_eq!(alice.kind(), AccountKind::Standard);
    assert_eq!(alice.daily_limit(), dec("4000"));
    assert!(alice.is_active());
    // Four movements: opening deposit, deposit, transfer leg, withdrawal.
    assert_eq!(alice.log().len(), 4);
    assert_eq!(alice.daily_withdrawn(), dec("0"));

    let bob = reloaded.account(10002).unwrap();
    assert_eq!(bob.balance(), dec("125"));
    assert_eq!(bob.kind(), AccountKind::Overdraft);
    assert!(!bob.is_active());
    assert_eq!(bob.log().len(), 2);

    let err = reloaded.deposit(10002, dec("1")).unwrap_err();
    assert!(matches!(err, LedgerError::AccountBlocked(10002)));

    let dana = reloaded
        .create_account("Dana", AccountKind::Standard, dec("0"))
        .unwrap()
        .account;
    assert_eq!(dana, 10003);
}

#[test]
fn reload_preserves_record_details() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at(start());

    let before_reload = {
        let mut ledger = open_ledger(dir.path(), &clock);
        let alice = ledger
            .create_account("Alice", AccountKind::Standard, dec("100"))
            .unwrap()
            .account;
        let bob = ledger
            .create_account("Bob", AccountKind::Standard, dec("0"))
            .unwrap()
            .account;
        ledger.transfer(alice, bob, dec("12.34")).unwrap();
        ledger.account(alice).unwrap().log().clone()
    };

    let reloaded = open_ledger(dir.path(), &clock);
    assert_eq!(reloaded.account(10001).unwrap().log(), &before_reload);

    let out = before_reload.all().last().unwrap();
    assert_eq!(out.description(), "Online transfer");
    assert_eq!(out.timestamp(), start());
    assert_eq!(out.source(), Some(10001));
    assert_eq!(out.target(), Some(10002));
}

#[test]
fn deleted_ids_stay_retired_across_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at(start());

    {
        let mut ledger = open_ledger(dir.path(), &clock);
        let alice = ledger
            .create_account("Alice", AccountKind::Standard, dec("100"))
            .unwrap()
            .account;
        let bob = ledger
            .create_account("Bob", AccountKind::Standard, dec("0"))
            .unwrap()
            .account;
        ledger.transfer(alice, bob, dec("10")).unwrap();
        ledger.delete_account(bob).unwrap();
    }

    let mut reloaded = open_ledger(dir.path(), &clock);
    assert_eq!(reloaded.accounts().count(), 1);
    assert!(reloaded.account(10002).is_none());

    // 10002 still appears as a transfer target in Alice's history, so the
    // counter seeds past it and Carol does not inherit the id.
    let carol = reloaded
        .create_account("Carol", AccountKind::Standard, dec("0"))
        .unwrap()
        .account;
    assert_eq!(carol, 10003);
}

#[test]
fn daily_window_is_per_session() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at(start());

    {
        let mut ledger = open_ledger(dir.path(), &clock);
        let alice = ledger
            .create_account("Alice", AccountKind::Standard, dec("20000"))
            .unwrap()
            .account;
        ledger.withdraw(alice, dec("5000")).unwrap();
        let err = ledger.withdraw(alice, dec("1")).unwrap_err();
        assert!(matches!(err, LedgerError::LimitExceeded { .. }));
    }

    // The tally is not persisted; a restart starts a fresh window even on
    // the same calendar day.
    let mut reloaded = open_ledger(dir.path(), &clock);
    reloaded.withdraw(10001, dec("5000")).unwrap();
    assert_eq!(reloaded.account(10001).unwrap().balance(), dec("10000"));
}

#[test]
fn calendar_day_rollover_resets_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FixedClock::at(start());
    let mut ledger = open_ledger(dir.path(), &clock);

    let alice = ledger
        .create_account("Alice", AccountKind::Standard, dec("20000"))
        .unwrap()
        .account;
    ledger.withdraw(alice, dec("5000")).unwrap();
    assert!(matches!(
        ledger.withdraw(alice, dec("1")),
        Err(LedgerError::LimitExceeded { .. })
    ));

    clock.advance_days(1);
    ledger.withdraw(alice, dec("5000")).unwrap();
    assert_eq!(ledger.account(alice).unwrap().daily_withdrawn(), dec("5000"));
}
