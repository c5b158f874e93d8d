use crate::{
    common::{error::TransactionError, money::Money},
    domain::{
        store::LedgerStore,
        transaction::{NewTransaction, TransactionRecord, TxResult, TxType},
    },
};

/// Records a USE attempt that failed after the request reached the processor.
/// The balance is not touched; the snapshot is the current balance.
pub fn handle_use<S: LedgerStore + ?Sized>(
    store: &S,
    account_number: &str,
    amount: Money,
) -> Result<TransactionRecord, TransactionError> {
    record(store, account_number, TxType::Use, amount)
}

/// Cancel counterpart of [`handle_use`].
pub fn handle_cancel<S: LedgerStore + ?Sized>(
    store: &S,
    account_number: &str,
    amount: Money,
) -> Result<TransactionRecord, TransactionError> {
    record(store, account_number, TxType::Cancel, amount)
}

fn record<S: LedgerStore + ?Sized>(
    store: &S,
    account_number: &str,
    tx_type: TxType,
    amount: Money,
) -> Result<TransactionRecord, TransactionError> {
    let account = store
        .find_account_by_number(account_number)?
        .ok_or(TransactionError::AccountNotFound)?;

    let entry = NewTransaction::for_account(&account, tx_type, TxResult::Fail, amount);
    Ok(store.append_transaction(entry)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{account::AccountStatus, ledger::Ledger, user::UserId};

    const ACCOUNT: &str = "1000000012";

    fn seed() -> Ledger {
        let ledger = Ledger::new();
        ledger
            .insert_account(UserId(12), ACCOUNT, AccountStatus::Active, Money::new(100_000))
            .unwrap();
        ledger
    }

    #[test]
    fn failed_use_snapshots_unchanged_balance() {
        let ledger = seed();

        let rec = handle_use(&ledger, ACCOUNT, Money::new(1_000)).unwrap();

        assert_eq!(rec.tx_type(), TxType::Use);
        assert_eq!(rec.result(), TxResult::Fail);
        assert_eq!(rec.amount(), Money::new(1_000));
        assert_eq!(rec.balance_snapshot(), Money::new(100_000));
        let account = ledger.find_account_by_number(ACCOUNT).unwrap().unwrap();
        assert_eq!(account.balance, Money::new(100_000));
    }

    #[test]
    fn failed_cancel_is_recorded_as_cancel_fail() {
        let ledger = seed();
        let rec = handle_cancel(&ledger, ACCOUNT, Money::new(1_000)).unwrap();
        assert_eq!(rec.tx_type(), TxType::Cancel);
        assert_eq!(rec.result(), TxResult::Fail);
        assert_eq!(rec.balance_snapshot(), Money::new(100_000));
    }

    #[test]
    fn failed_use_on_vanished_account_is_not_found() {
        let ledger = Ledger::new();
        assert_eq!(
            handle_use(&ledger, ACCOUNT, Money::new(1_000)).unwrap_err(),
            TransactionError::AccountNotFound
        );
    }

    #[test]
    fn failed_entries_are_recorded_for_unregistered_accounts_too() {
        let ledger = Ledger::new();
        ledger
            .insert_account(UserId(12), ACCOUNT, AccountStatus::Unregistered, Money::zero())
            .unwrap();
        let rec = handle_use(&ledger, ACCOUNT, Money::new(10)).unwrap();
        assert_eq!(rec.result(), TxResult::Fail);
        assert_eq!(ledger.transactions_for(ACCOUNT).unwrap().len(), 1);
    }
}
