use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use account_ledger::{
    common::{config::Policy, error::TransactionError, money::Money},
    domain::{
        account::AccountStatus,
        ledger::Ledger,
        store::LedgerStore,
        transaction::{TxResult, TxType},
        user::{AccountUser, UserId},
    },
    worker::processor::Processor,
};

const THREADS: u64 = 8;
const USES_PER_THREAD: u64 = 25;
const AMOUNT: u64 = 10;

fn processor(accounts: &[&str], balance: u64) -> Processor<Ledger> {
    let ledger = Ledger::new();
    ledger.insert_user(AccountUser::new(UserId(1), "Pobi")).unwrap();
    for number in accounts {
        ledger
            .insert_account(UserId(1), number, AccountStatus::Active, Money::new(balance))
            .unwrap();
    }
    let policy = Policy {
        lock_wait_ms: 10_000,
        ..Policy::default()
    };
    Processor::new(Arc::new(ledger), policy)
}

#[test]
fn concurrent_uses_on_one_account_serialize() {
    let account = "1000000001";
    let p = processor(&[account], THREADS * USES_PER_THREAD * AMOUNT);

    let receipts: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    (0..USES_PER_THREAD)
                        .map(|_| p.use_balance(UserId(1), account, Money::new(AMOUNT)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    let total = THREADS * USES_PER_THREAD;
    assert_eq!(receipts.len() as u64, total);

    let balance = p.store().find_account_by_number(account).unwrap().unwrap().balance;
    assert!(balance.is_zero());

    let ids: HashSet<_> = receipts.iter().map(|r| r.transaction_id.clone()).collect();
    assert_eq!(ids.len() as u64, total);

    // every post-debit balance from the serial order shows up exactly once
    let mut snapshots: Vec<u64> = receipts.iter().map(|r| r.balance_snapshot.as_u64()).collect();
    snapshots.sort_unstable();
    let expected: Vec<u64> = (0..total).map(|i| i * AMOUNT).collect();
    assert_eq!(snapshots, expected);

    // ledger order agrees with the snapshots
    let entries = p.store().transactions_for(account).unwrap();
    assert_eq!(entries.len() as u64, total);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.tx_type(), TxType::Use);
        assert_eq!(entry.result(), TxResult::Success);
        assert_eq!(entry.balance_snapshot().as_u64(), (total - 1 - i as u64) * AMOUNT);
    }
}

#[test]
fn overdraw_race_never_goes_negative() {
    let account = "1000000002";
    let p = processor(&[account], 5 * AMOUNT);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| s.spawn(|| p.use_balance(UserId(1), account, Money::new(AMOUNT))))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 5);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == TransactionError::AmountExceedsBalance));

    let balance = p.store().find_account_by_number(account).unwrap().unwrap().balance;
    assert!(balance.is_zero());
}

#[test]
fn different_accounts_proceed_independently() {
    let accounts = ["1000000003", "1000000004", "1000000005"];
    let p = processor(&accounts, USES_PER_THREAD * AMOUNT);

    thread::scope(|s| {
        for account in accounts {
            let p = &p;
            s.spawn(move || {
                for _ in 0..USES_PER_THREAD {
                    p.use_balance(UserId(1), account, Money::new(AMOUNT)).unwrap();
                }
            });
        }
    });

    for account in accounts {
        let acc = p.store().find_account_by_number(account).unwrap().unwrap();
        assert!(acc.balance.is_zero());
        assert_eq!(
            p.store().transactions_for(account).unwrap().len() as u64,
            USES_PER_THREAD
        );
    }
}
