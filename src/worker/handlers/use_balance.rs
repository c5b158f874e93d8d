use crate::{
    common::{error::TransactionError, money::Money},
    domain::{
        store::LedgerStore,
        transaction::{NewTransaction, TransactionRecord, TxResult, TxType},
        user::UserId,
    },
};

/// Debits `amount` from the account and records a successful USE entry.
///
/// Checks run in a fixed order and the first failure wins: user, account,
/// ownership, status, sufficiency. Nothing is written unless every check passes.
pub fn handle<S: LedgerStore + ?Sized>(
    store: &S,
    user: UserId,
    account_number: &str,
    amount: Money,
) -> Result<TransactionRecord, TransactionError> {
    let user = store
        .find_user_by_id(user)?
        .ok_or(TransactionError::UserNotFound)?;
    let mut account = store
        .find_account_by_number(account_number)?
        .ok_or(TransactionError::AccountNotFound)?;

    if !account.is_owned_by(user.id) {
        return Err(TransactionError::UserAccountUnmatched);
    }
    if !account.is_active() {
        return Err(TransactionError::AccountAlreadyUnregistered);
    }
    if amount > account.balance {
        return Err(TransactionError::AmountExceedsBalance);
    }

    account.debit(amount)?;

    let entry = NewTransaction::for_account(&account, TxType::Use, TxResult::Success, amount);
    Ok(store.commit(&account, entry)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        account::AccountStatus,
        ledger::Ledger,
        user::AccountUser,
    };

    const ACCOUNT: &str = "1000000012";

    // Helper: one user (12) owning ACCOUNT, plus a second user (13) with nothing.
    fn seed(status: AccountStatus, balance: u64) -> Ledger {
        let ledger = Ledger::new();
        ledger.insert_user(AccountUser::new(UserId(12), "Pobi")).unwrap();
        ledger.insert_user(AccountUser::new(UserId(13), "Harry")).unwrap();
        ledger
            .insert_account(UserId(12), ACCOUNT, status, Money::new(balance))
            .unwrap();
        ledger
    }

    fn balance(ledger: &Ledger) -> Money {
        ledger.find_account_by_number(ACCOUNT).unwrap().unwrap().balance
    }

    #[test]
    fn use_debits_and_records_success_entry() {
        let ledger = seed(AccountStatus::Active, 100_000);

        let rec = handle(&ledger, UserId(12), ACCOUNT, Money::new(1_000)).unwrap();

        assert_eq!(balance(&ledger), Money::new(99_000));
        assert_eq!(rec.tx_type(), TxType::Use);
        assert_eq!(rec.result(), TxResult::Success);
        assert_eq!(rec.amount(), Money::new(1_000));
        assert_eq!(rec.balance_snapshot(), Money::new(99_000));
        assert_eq!(rec.account_number(), ACCOUNT);
        assert_eq!(rec.transaction_id().len(), 32);
    }

    #[test]
    fn unknown_user_fails_first() {
        let ledger = seed(AccountStatus::Active, 100_000);
        let err = handle(&ledger, UserId(99), "0000000000", Money::new(1_000)).unwrap_err();
        assert_eq!(err, TransactionError::UserNotFound);
    }

    #[test]
    fn unknown_account_fails() {
        let ledger = seed(AccountStatus::Active, 100_000);
        let err = handle(&ledger, UserId(12), "0000000000", Money::new(1_000)).unwrap_err();
        assert_eq!(err, TransactionError::AccountNotFound);
    }

    #[test]
    fn account_of_another_user_is_unmatched() {
        let ledger = seed(AccountStatus::Active, 100_000);
        let err = handle(&ledger, UserId(13), ACCOUNT, Money::new(1_000)).unwrap_err();
        assert_eq!(err, TransactionError::UserAccountUnmatched);
        assert_eq!(balance(&ledger), Money::new(100_000));
    }

    #[test]
    fn ownership_is_checked_before_status() {
        let ledger = seed(AccountStatus::Unregistered, 0);
        let err = handle(&ledger, UserId(13), ACCOUNT, Money::new(1_000)).unwrap_err();
        assert_eq!(err, TransactionError::UserAccountUnmatched);
    }

    #[test]
    fn unregistered_account_is_rejected() {
        let ledger = seed(AccountStatus::Unregistered, 100_000);
        let err = handle(&ledger, UserId(12), ACCOUNT, Money::new(1_000)).unwrap_err();
        assert_eq!(err, TransactionError::AccountAlreadyUnregistered);
    }

    #[test]
    fn amount_equal_to_balance_empties_account() {
        let ledger = seed(AccountStatus::Active, 1_000);
        let rec = handle(&ledger, UserId(12), ACCOUNT, Money::new(1_000)).unwrap();
        assert!(balance(&ledger).is_zero());
        assert!(rec.balance_snapshot().is_zero());
    }

    #[test]
    fn amount_one_over_balance_fails_without_writing() {
        let ledger = seed(AccountStatus::Active, 1_000);
        let err = handle(&ledger, UserId(12), ACCOUNT, Money::new(1_001)).unwrap_err();
        assert_eq!(err, TransactionError::AmountExceedsBalance);
        assert_eq!(balance(&ledger), Money::new(1_000));
        assert!(ledger.transactions_for(ACCOUNT).unwrap().is_empty());
    }
}
