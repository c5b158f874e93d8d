use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::{
    common::{config::Policy, error::TransactionError, event::OperationEvent, money::Money},
    domain::{
        store::LedgerStore,
        transaction::{TransactionRecord, TxResult, TxType},
        user::UserId,
    },
    worker::{
        handlers::{cancel_balance, failed, query, use_balance},
        lock::AccountLocks,
    },
};

/// What a successful use or cancel hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub account_number: String,
    pub result: TxResult,
    pub transaction_id: String,
    pub amount: Money,
    pub balance_snapshot: Money,
    pub transacted_at: DateTime<Utc>,
}

impl From<&TransactionRecord> for TransactionReceipt {
    fn from(rec: &TransactionRecord) -> Self {
        Self {
            account_number: rec.account_number().to_string(),
            result: rec.result(),
            transaction_id: rec.transaction_id().to_string(),
            amount: rec.amount(),
            balance_snapshot: rec.balance_snapshot(),
            transacted_at: rec.transacted_at(),
        }
    }
}

/// Read-only view of a ledger entry returned by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetails {
    pub account_number: String,
    pub transaction_id: String,
    pub transaction_type: TxType,
    pub result: TxResult,
    pub amount: Money,
    pub balance_snapshot: Money,
    pub transacted_at: DateTime<Utc>,
}

impl From<&TransactionRecord> for TransactionDetails {
    fn from(rec: &TransactionRecord) -> Self {
        Self {
            account_number: rec.account_number().to_string(),
            transaction_id: rec.transaction_id().to_string(),
            transaction_type: rec.tx_type(),
            result: rec.result(),
            amount: rec.amount(),
            balance_snapshot: rec.balance_snapshot(),
            transacted_at: rec.transacted_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(TransactionReceipt),
    Found(TransactionDetails),
    Recorded,
}

/// The transaction processor.
///
/// Shareable across request threads (`&self` everywhere). Use and cancel run
/// under an exclusive per-account-number lock; query and the failure recorders
/// do not, since they never change a balance.
pub struct Processor<S: LedgerStore> {
    store: Arc<S>,
    policy: Policy,
    locks: AccountLocks,
}

impl<S: LedgerStore> Processor<S> {
    pub fn new(store: Arc<S>, policy: Policy) -> Self {
        Self {
            store,
            policy,
            locks: AccountLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn process(&self, event: OperationEvent) -> Result<Outcome, TransactionError> {
        match event {
            OperationEvent::Use {
                user,
                account_number,
                amount,
            } => self
                .use_balance(user, &account_number, amount)
                .map(Outcome::Completed),
            OperationEvent::Cancel {
                transaction_id,
                account_number,
                amount,
            } => self
                .cancel_balance(&transaction_id, &account_number, amount)
                .map(Outcome::Completed),
            OperationEvent::Query { transaction_id } => {
                self.query_transaction(&transaction_id).map(Outcome::Found)
            }
            OperationEvent::FailedUse {
                account_number,
                amount,
            } => self
                .record_failed_use(&account_number, amount)
                .map(|()| Outcome::Recorded),
            OperationEvent::FailedCancel {
                account_number,
                amount,
            } => self
                .record_failed_cancel(&account_number, amount)
                .map(|()| Outcome::Recorded),
        }
    }

    pub fn use_balance(
        &self,
        user: UserId,
        account_number: &str,
        amount: Money,
    ) -> Result<TransactionReceipt, TransactionError> {
        let result = self.check_amount(amount).and_then(|()| {
            let _guard = self.locks.acquire(account_number, self.policy.lock_wait())?;
            use_balance::handle(self.store.as_ref(), user, account_number, amount)
        });
        let rec = report("use", account_number, result)?;
        info!(
            account_number,
            transaction_id = rec.transaction_id(),
            amount = %amount,
            balance = %rec.balance_snapshot(),
            "balance used"
        );
        Ok(TransactionReceipt::from(&rec))
    }

    pub fn cancel_balance(
        &self,
        transaction_id: &str,
        account_number: &str,
        amount: Money,
    ) -> Result<TransactionReceipt, TransactionError> {
        let result = self.check_amount(amount).and_then(|()| {
            let _guard = self.locks.acquire(account_number, self.policy.lock_wait())?;
            cancel_balance::handle(
                self.store.as_ref(),
                &self.policy,
                Utc::now(),
                transaction_id,
                account_number,
                amount,
            )
        });
        let rec = report("cancel", account_number, result)?;
        info!(
            account_number,
            original_transaction_id = transaction_id,
            transaction_id = rec.transaction_id(),
            amount = %amount,
            balance = %rec.balance_snapshot(),
            "balance use cancelled"
        );
        Ok(TransactionReceipt::from(&rec))
    }

    pub fn query_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<TransactionDetails, TransactionError> {
        let rec = report(
            "query",
            "-",
            query::handle(self.store.as_ref(), transaction_id),
        )?;
        Ok(TransactionDetails::from(&rec))
    }

    pub fn record_failed_use(
        &self,
        account_number: &str,
        amount: Money,
    ) -> Result<(), TransactionError> {
        let rec = report(
            "fail_use",
            account_number,
            failed::handle_use(self.store.as_ref(), account_number, amount),
        )?;
        info!(
            account_number,
            transaction_id = rec.transaction_id(),
            amount = %amount,
            "failed use recorded"
        );
        Ok(())
    }

    pub fn record_failed_cancel(
        &self,
        account_number: &str,
        amount: Money,
    ) -> Result<(), TransactionError> {
        let rec = report(
            "fail_cancel",
            account_number,
            failed::handle_cancel(self.store.as_ref(), account_number, amount),
        )?;
        info!(
            account_number,
            transaction_id = rec.transaction_id(),
            amount = %amount,
            "failed cancel recorded"
        );
        Ok(())
    }

    // Same bounds as io::validation, for callers that skip the CSV boundary.
    fn check_amount(&self, amount: Money) -> Result<(), TransactionError> {
        if self.policy.amount_in_bounds(amount) {
            Ok(())
        } else {
            Err(TransactionError::InvalidRequest(format!(
                "amount {amount} outside [{}, {}]",
                self.policy.min_amount, self.policy.max_amount
            )))
        }
    }

    #[cfg(test)]
    pub(crate) fn locks(&self) -> &AccountLocks {
        &self.locks
    }
}

fn report<T>(
    op: &'static str,
    account_number: &str,
    result: Result<T, TransactionError>,
) -> Result<T, TransactionError> {
    if let Err(err) = &result {
        match err {
            TransactionError::Internal(cause) => {
                error!(op, account_number, %cause, "operation failed");
            }
            other => {
                warn!(
                    op,
                    account_number,
                    code = %other.code(),
                    retryable = other.is_retryable(),
                    "operation rejected"
                );
            }
        }
    }
    result
}
