use crate::{
    common::error::StoreError,
    domain::{
        account::Account,
        transaction::{NewTransaction, TransactionRecord},
        user::{AccountUser, UserId},
    },
};

/// Collaborators the transaction processor reads from and writes to.
///
/// Implementations must be read-after-write consistent. `commit` is the unit of
/// work for balance-changing operations: the account save and the entry append
/// either both happen or neither does.
pub trait LedgerStore: Send + Sync {
    fn find_user_by_id(&self, id: UserId) -> Result<Option<AccountUser>, StoreError>;

    fn find_account_by_number(&self, number: &str) -> Result<Option<Account>, StoreError>;

    fn find_transaction_by_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<TransactionRecord>, StoreError>;

    /// The successful CANCEL that reversed `transaction_id`, if any.
    fn find_reversal_of(
        &self,
        transaction_id: &str,
    ) -> Result<Option<TransactionRecord>, StoreError>;

    /// Appends an entry that records no balance change.
    fn append_transaction(&self, entry: NewTransaction) -> Result<TransactionRecord, StoreError>;

    /// Saves the mutated `account` and appends `entry` atomically.
    fn commit(
        &self,
        account: &Account,
        entry: NewTransaction,
    ) -> Result<TransactionRecord, StoreError>;
}
