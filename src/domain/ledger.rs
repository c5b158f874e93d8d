use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    common::{config::Policy, error::StoreError, money::Money},
    domain::{
        account::{Account, AccountId, AccountStatus},
        store::LedgerStore,
        transaction::{NewTransaction, TransactionRecord},
        user::{AccountUser, UserId},
    },
};

/// In-memory account directory and transaction log.
///
/// A single `RwLock` guards all state, which is what makes [`LedgerStore::commit`]
/// atomic: the account write and the entry append happen under one write guard.
#[derive(Debug)]
pub struct Ledger {
    inner: RwLock<LedgerState>,
    max_accounts_per_user: usize,
}

#[derive(Debug, Default)]
struct LedgerState {
    users: HashMap<UserId, AccountUser>,
    accounts: HashMap<String, Account>,
    txs: HashMap<String, TransactionRecord>,
    /// Reversed USE id -> id of the CANCEL that reversed it.
    reversals: HashMap<String, String>,
    next_account_id: u64,
    next_seq: u64,
}

impl LedgerState {
    fn append(&mut self, entry: NewTransaction) -> Result<TransactionRecord, StoreError> {
        if self.txs.contains_key(&entry.transaction_id) {
            return Err(StoreError::DuplicateTransactionId(entry.transaction_id));
        }
        if let Some(original) = &entry.reverses {
            if self.reversals.contains_key(original) {
                return Err(StoreError::AlreadyReversed(original.clone()));
            }
            self.reversals.insert(original.clone(), entry.transaction_id.clone());
        }
        self.next_seq += 1;
        let record = TransactionRecord::new(self.next_seq, entry);
        self.txs
            .insert(record.transaction_id().to_string(), record.clone());
        Ok(record)
    }

    fn existing_account(&self, account: &Account) -> Result<(), StoreError> {
        match self.accounts.get(&account.account_number) {
            Some(stored) if stored.id == account.id => Ok(()),
            _ => Err(StoreError::UnknownAccount(account.account_number.clone())),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::with_account_limit(Policy::default().max_accounts_per_user)
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger that holds at most `max_accounts_per_user` accounts per owner.
    pub fn with_account_limit(max_accounts_per_user: usize) -> Self {
        Self {
            inner: RwLock::new(LedgerState::default()),
            max_accounts_per_user,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>, StoreError> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }

    pub fn insert_user(&self, user: AccountUser) -> Result<(), StoreError> {
        self.write()?.users.insert(user.id, user);
        Ok(())
    }

    /// Registers an account and returns it with its internal id assigned.
    pub fn insert_account(
        &self,
        owner: UserId,
        account_number: &str,
        status: AccountStatus,
        balance: Money,
    ) -> Result<Account, StoreError> {
        let mut state = self.write()?;
        if state.accounts.contains_key(account_number) {
            return Err(StoreError::DuplicateAccountNumber(account_number.to_string()));
        }
        let held = state.accounts.values().filter(|a| a.owner == owner).count();
        if held >= self.max_accounts_per_user {
            return Err(StoreError::AccountLimitReached {
                user: owner,
                limit: self.max_accounts_per_user,
            });
        }
        state.next_account_id += 1;
        let account = Account::new(
            AccountId(state.next_account_id),
            owner,
            account_number,
            status,
            balance,
        );
        state
            .accounts
            .insert(account.account_number.clone(), account.clone());
        Ok(account)
    }

    /// Re-points an account number to a different account record.
    #[cfg(test)]
    pub(crate) fn replace_account(&self, account: Account) -> Result<(), StoreError> {
        self.write()?
            .accounts
            .insert(account.account_number.clone(), account);
        Ok(())
    }

    /// Appends an entry as-is, timestamp included. Used to load history.
    pub fn insert_transaction(
        &self,
        entry: NewTransaction,
    ) -> Result<TransactionRecord, StoreError> {
        self.write()?.append(entry)
    }

    pub fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self.read()?.accounts.values().cloned().collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    /// Entries recorded against `account_number`, oldest first.
    pub fn transactions_for(
        &self,
        account_number: &str,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut records: Vec<TransactionRecord> = self
            .read()?
            .txs
            .values()
            .filter(|t| t.account_number() == account_number)
            .cloned()
            .collect();
        records.sort_by_key(TransactionRecord::seq);
        Ok(records)
    }
}

impl LedgerStore for Ledger {
    fn find_user_by_id(&self, id: UserId) -> Result<Option<AccountUser>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    fn find_account_by_number(&self, number: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.read()?.accounts.get(number).cloned())
    }

    fn find_transaction_by_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        Ok(self.read()?.txs.get(transaction_id).cloned())
    }

    fn find_reversal_of(
        &self,
        transaction_id: &str,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        let state = self.read()?;
        Ok(state
            .reversals
            .get(transaction_id)
            .and_then(|cancel_id| state.txs.get(cancel_id))
            .cloned())
    }

    fn append_transaction(&self, entry: NewTransaction) -> Result<TransactionRecord, StoreError> {
        self.write()?.append(entry)
    }

    fn commit(
        &self,
        account: &Account,
        entry: NewTransaction,
    ) -> Result<TransactionRecord, StoreError> {
        let mut state = self.write()?;
        state.existing_account(account)?;
        // Append first: it is the only step that can still fail.
        let record = state.append(entry)?;
        state
            .accounts
            .insert(account.account_number.clone(), account.clone());
        Ok(record)
    }
}
