use std::{
    collections::HashSet,
    sync::{Condvar, Mutex},
    time::Duration,
};

use tracing::debug;

use crate::common::error::TransactionError;

/// In-process mutual exclusion keyed by account number.
///
/// Operations on different accounts never wait on each other; operations on the
/// same account are serialized. A waiter gives up after the configured timeout.
#[derive(Debug, Default)]
pub struct AccountLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

/// Releases the account on drop, on every exit path.
#[derive(Debug)]
pub struct AccountLockGuard<'a> {
    locks: &'a AccountLocks,
    account_number: String,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(
        &self,
        account_number: &str,
        wait: Duration,
    ) -> Result<AccountLockGuard<'_>, TransactionError> {
        let held = self
            .held
            .lock()
            .map_err(|_| TransactionError::Internal("account lock registry poisoned".into()))?;
        let (mut held, timeout) = self
            .released
            .wait_timeout_while(held, wait, |held| held.contains(account_number))
            .map_err(|_| TransactionError::Internal("account lock registry poisoned".into()))?;

        if timeout.timed_out() && held.contains(account_number) {
            debug!(account_number, "lock wait timed out");
            return Err(TransactionError::LockTimeout {
                account_number: account_number.to_string(),
            });
        }

        held.insert(account_number.to_string());
        debug!(account_number, "lock acquired");
        Ok(AccountLockGuard {
            locks: self,
            account_number: account_number.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self, account_number: &str) -> bool {
        self.held
            .lock()
            .map(|held| held.contains(account_number))
            .unwrap_or(false)
    }

    fn release(&self, account_number: &str) {
        // A poisoned registry still has to let go of the key.
        let mut held = match self.held.lock() {
            Ok(held) => held,
            Err(poisoned) => poisoned.into_inner(),
        };
        held.remove(account_number);
        drop(held);
        self.released.notify_all();
        debug!(account_number, "lock released");
    }
}

impl Drop for AccountLockGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.account_number);
    }
}
