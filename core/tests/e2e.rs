use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use burry_core::interface::SOL_USD_FEED;
use burry_core::{
    EscrowConfig, EscrowError, EscrowState, Identity, Ledger, MockFeed, Price, Result,
};

const OWNER: Identity = Identity::new([42u8; 32]);

fn assert_err<T, E>(res: Result<T>, expected: E)
where
    E: std::fmt::Debug + PartialEq<E>,
    EscrowError: Into<E> + PartialEq<E>,
{
    match res {
        Err(e) => assert_eq!(e.into(), expected),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

fn ledger(rent_exempt_minimum: u64) -> Ledger {
    let mut ledger = Ledger::new(EscrowConfig {
        rent_exempt_minimum,
        ..EscrowConfig::default()
    });
    ledger.set_clock(1_700_000_000);
    ledger.fund(OWNER, 1_000_000).unwrap();
    ledger
}

#[test]
fn escrow_lifecycle() {
    // deposit 100 @ 20; oracle 15 -> locked; oracle 25 -> released
    let mut ledger = ledger(0);
    let now = ledger.clock();
    let escrow = ledger.deposit(OWNER, 100, 20).unwrap();

    let record = ledger.escrow(&escrow).unwrap().clone();
    assert_eq!(record.balance, 100);
    assert_eq!(record.unlock_price, 20);

    let mut feed = MockFeed::new(SOL_USD_FEED);
    feed.publish(Price::whole(15), now);
    assert_err(
        ledger.withdraw(OWNER, escrow, &feed),
        EscrowError::ConditionNotMet,
    );
    assert_eq!(ledger.escrow(&escrow), Some(&record));
    assert_eq!(ledger.balance(&OWNER), 1_000_000 - 100);

    feed.publish(Price::whole(25), now);
    let before = ledger.balance(&OWNER);
    let withdrawal = ledger.withdraw(OWNER, escrow, &feed).unwrap();
    assert_eq!(withdrawal.released, 100);
    assert_eq!(ledger.balance(&OWNER), before + 100);
    assert_eq!(ledger.escrow(&escrow), None);
    assert_eq!(ledger.state(&escrow), EscrowState::Closed);

    // nothing left to withdraw
    assert_err(
        ledger.withdraw(OWNER, escrow, &feed),
        EscrowError::EscrowNotFound,
    );
}

#[test]
fn deposit_is_not_idempotent() {
    let mut ledger = ledger(890_880);
    let escrow = ledger.deposit(OWNER, 100, 20).unwrap();
    let balance = ledger.balance(&OWNER);

    assert_err(ledger.deposit(OWNER, 100, 20), EscrowError::AlreadyInitialized);
    assert_err(ledger.deposit(OWNER, 5, 99), EscrowError::AlreadyInitialized);

    // first record untouched, no funds moved by the failed attempts
    assert_eq!(ledger.escrow(&escrow).unwrap().unlock_price, 20);
    assert_eq!(ledger.escrow(&escrow).unwrap().balance, 100);
    assert_eq!(ledger.balance(&OWNER), balance);
}

#[test]
fn rent_reserve_is_refunded_on_close() {
    let rent = 890_880;
    let mut ledger = ledger(rent);
    let now = ledger.clock();
    let escrow = ledger.deposit(OWNER, 100, 20).unwrap();
    assert_eq!(ledger.escrow_lamports(&escrow), 100 + rent);

    let mut feed = MockFeed::new(SOL_USD_FEED);
    feed.publish(Price::new(2_001, 2), now);
    let before = ledger.balance(&OWNER);
    let withdrawal = ledger.withdraw(OWNER, escrow, &feed).unwrap();

    assert_eq!(withdrawal.released, 100);
    assert_eq!(withdrawal.rent_refund, rent);
    assert_eq!(ledger.balance(&OWNER), before + 100 + rent);
    assert_eq!(ledger.balance(&OWNER), 1_000_000);
}

#[test]
fn unaffordable_deposit() {
    let mut ledger = ledger(1_000);
    assert_err(
        ledger.deposit(OWNER, 999_001, 20),
        EscrowError::InsufficientFunds {
            required: 1_000_001,
            available: 1_000_000,
        },
    );
    let escrow = ledger.escrow_address(&OWNER).unwrap();
    assert_eq!(ledger.state(&escrow), EscrowState::Uninitialized);
}

#[test]
fn oracle_failures_abort_withdrawal() {
    let mut ledger = ledger(0);
    let now = ledger.clock();
    let escrow = ledger.deposit(OWNER, 100, 20).unwrap();
    let mut feed = MockFeed::new(SOL_USD_FEED);

    // no confirmed value is never treated as zero
    assert_err(
        ledger.withdraw(OWNER, escrow, &feed),
        EscrowError::NoOracleValue,
    );

    // passing price, but older than the staleness window
    feed.publish(Price::whole(25), now - 301);
    assert_err(
        ledger.withdraw(OWNER, escrow, &feed),
        EscrowError::StalePrice {
            published_at: now - 301,
            now,
            max_staleness: 300,
        },
    );

    // equal is not above
    feed.publish(Price::whole(20), now);
    assert_err(
        ledger.withdraw(OWNER, escrow, &feed),
        EscrowError::ConditionNotMet,
    );

    // a round that lost its confirmed value
    feed.publish(Price::whole(25), now);
    feed.clear();
    assert_err(
        ledger.withdraw(OWNER, escrow, &feed),
        EscrowError::NoOracleValue,
    );

    // threshold lifted past i128 at this scale is simply not reached
    feed.publish(Price::new(i128::MAX, 38), now);
    assert_err(
        ledger.withdraw(OWNER, escrow, &feed),
        EscrowError::ConditionNotMet,
    );

    assert_eq!(ledger.state(&escrow), EscrowState::Funded);
    assert_eq!(ledger.escrow(&escrow).unwrap().balance, 100);
}

#[test]
fn concurrent_withdrawals_release_once() {
    let ledger = ledger(0);
    let shared = Arc::new(Mutex::new(ledger));
    let escrow = {
        let mut ledger = shared.lock().unwrap();
        ledger.deposit(OWNER, 100, 20).unwrap()
    };
    let now = shared.lock().unwrap().clock();

    let mut feed = MockFeed::new(SOL_USD_FEED);
    feed.publish(Price::whole(25), now);
    let feed = Arc::new(feed);

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let shared = Arc::clone(&shared);
            let feed = Arc::clone(&feed);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut ledger = shared.lock().unwrap();
                ledger.withdraw(OWNER, escrow, &*feed)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .any(|r| r == &Err(EscrowError::EscrowNotFound)));

    let ledger = shared.lock().unwrap();
    assert_eq!(ledger.balance(&OWNER), 1_000_000);
    assert_eq!(ledger.escrow(&escrow), None);
}

#[test]
fn one_escrow_per_owner() {
    let mut ledger = ledger(0);
    let other = Identity::new([7u8; 32]);
    ledger.fund(other, 500).unwrap();

    let mine = ledger.deposit(OWNER, 100, 20).unwrap();
    let theirs = ledger.deposit(other, 200, 30).unwrap();
    assert_ne!(mine, theirs);
    assert_eq!(ledger.escrow(&theirs).unwrap().owner, other);

    let mut feed = MockFeed::new(SOL_USD_FEED);
    feed.publish(Price::whole(25), ledger.clock());

    // owner cannot touch the other escrow
    assert_err(
        ledger.withdraw(OWNER, theirs, &feed),
        EscrowError::AddressMismatch,
    );
    // 25 clears 20 but not 30
    assert!(ledger.withdraw(OWNER, mine, &feed).is_ok());
    assert_err(
        ledger.withdraw(other, theirs, &feed),
        EscrowError::ConditionNotMet,
    );
}
