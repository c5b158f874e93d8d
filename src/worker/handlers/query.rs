use crate::{
    common::error::TransactionError,
    domain::{store::LedgerStore, transaction::TransactionRecord},
};

pub fn handle<S: LedgerStore + ?Sized>(
    store: &S,
    transaction_id: &str,
) -> Result<TransactionRecord, TransactionError> {
    store
        .find_transaction_by_id(transaction_id)?
        .ok_or(TransactionError::TransactionNotFound)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        common::money::Money,
        domain::{
            account::AccountStatus,
            ledger::Ledger,
            transaction::{NewTransaction, TxResult, TxType},
            user::UserId,
        },
    };

    #[test]
    fn query_returns_entry_even_when_old() {
        let ledger = Ledger::new();
        let account = ledger
            .insert_account(UserId(12), "1000000012", AccountStatus::Active, Money::new(9_000))
            .unwrap();
        let mut entry = NewTransaction::for_account(
            &account,
            TxType::Use,
            TxResult::Success,
            Money::new(1_000),
        );
        entry.transacted_at = Utc::now() - Duration::days(730);
        let stored = ledger.insert_transaction(entry).unwrap();

        let first = handle(&ledger, stored.transaction_id()).unwrap();
        let second = handle(&ledger, stored.transaction_id()).unwrap();

        assert_eq!(first, stored);
        assert_eq!(first, second, "query must not have side effects");
        assert_eq!(first.amount(), Money::new(1_000));
        assert_eq!(first.balance_snapshot(), Money::new(9_000));
    }

    #[test]
    fn query_unknown_id_fails() {
        let ledger = Ledger::new();
        assert_eq!(
            handle(&ledger, "transactionId").unwrap_err(),
            TransactionError::TransactionNotFound
        );
    }
}
