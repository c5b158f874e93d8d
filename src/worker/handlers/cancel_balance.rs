use chrono::{DateTime, Months, Utc};

use crate::{
    common::{config::Policy, error::TransactionError, money::Money},
    domain::{
        store::LedgerStore,
        transaction::{NewTransaction, TransactionRecord, TxResult, TxType},
    },
};

/// Reverses a prior debit in full and records a successful CANCEL entry.
///
/// The original entry is never touched; the reversal is a new entry that
/// points back at it. Only a successful USE can be reversed, and only once.
pub fn handle<S: LedgerStore + ?Sized>(
    store: &S,
    policy: &Policy,
    now: DateTime<Utc>,
    transaction_id: &str,
    account_number: &str,
    amount: Money,
) -> Result<TransactionRecord, TransactionError> {
    let original = store
        .find_transaction_by_id(transaction_id)?
        .ok_or(TransactionError::TransactionNotFound)?;
    let mut account = store
        .find_account_by_number(account_number)?
        .ok_or(TransactionError::AccountNotFound)?;

    if original.account_id() != account.id {
        return Err(TransactionError::TransactionAccountUnmatched);
    }
    if original.tx_type() != TxType::Use || original.result() != TxResult::Success {
        return Err(TransactionError::TransactionNotCancellable);
    }
    if store.find_reversal_of(transaction_id)?.is_some() {
        return Err(TransactionError::TransactionAlreadyCancelled);
    }
    if original.amount() != amount {
        return Err(TransactionError::CancelMustBeFull);
    }
    if is_too_old(original.transacted_at(), now, policy.cancel_window_months) {
        return Err(TransactionError::TooOldToCancel);
    }

    account.credit(amount)?;

    let entry = NewTransaction::for_account(&account, TxType::Cancel, TxResult::Success, amount)
        .reversing(original.transaction_id());
    Ok(store.commit(&account, entry)?)
}

fn is_too_old(transacted_at: DateTime<Utc>, now: DateTime<Utc>, window_months: u32) -> bool {
    now.checked_sub_months(Months::new(window_months))
        .is_some_and(|cutoff| transacted_at < cutoff)
}
