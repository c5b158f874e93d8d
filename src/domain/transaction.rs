use chrono::{DateTime, Utc};

use crate::{
    common::money::Money,
    domain::account::{Account, AccountId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    Use,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxResult {
    Success,
    Fail,
}

/// A ledger entry that has not been appended yet: no internal id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub transaction_id: String,
    pub account_id: AccountId,
    pub account_number: String,
    pub tx_type: TxType,
    pub result: TxResult,
    pub amount: Money,
    pub balance_snapshot: Money,
    pub transacted_at: DateTime<Utc>,
    /// Id of the USE entry a successful CANCEL reverses.
    pub reverses: Option<String>,
}

impl NewTransaction {
    /// Builds an entry for `account` in its current state; the snapshot is taken from it.
    pub fn for_account(
        account: &Account,
        tx_type: TxType,
        result: TxResult,
        amount: Money,
    ) -> Self {
        Self {
            transaction_id: new_transaction_id(),
            account_id: account.id,
            account_number: account.account_number.clone(),
            tx_type,
            result,
            amount,
            balance_snapshot: account.balance,
            transacted_at: Utc::now(),
            reverses: None,
        }
    }

    pub fn reversing(mut self, transaction_id: &str) -> Self {
        self.reverses = Some(transaction_id.to_string());
        self
    }
}

/// An appended, immutable ledger entry. Fields are read-only outside this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    seq: u64,
    entry: NewTransaction,
}

impl TransactionRecord {
    pub(crate) fn new(seq: u64, entry: NewTransaction) -> Self {
        Self { seq, entry }
    }

    /// Internal, auto-incrementing id. Never shown to clients.
    pub fn seq(&self) -> u64 {
        self.seq
    }
    pub fn transaction_id(&self) -> &str {
        &self.entry.transaction_id
    }
    pub fn account_id(&self) -> AccountId {
        self.entry.account_id
    }
    pub fn account_number(&self) -> &str {
        &self.entry.account_number
    }
    pub fn tx_type(&self) -> TxType {
        self.entry.tx_type
    }
    pub fn result(&self) -> TxResult {
        self.entry.result
    }
    pub fn amount(&self) -> Money {
        self.entry.amount
    }
    pub fn balance_snapshot(&self) -> Money {
        self.entry.balance_snapshot
    }
    pub fn transacted_at(&self) -> DateTime<Utc> {
        self.entry.transacted_at
    }
    pub fn reverses(&self) -> Option<&str> {
        self.entry.reverses.as_deref()
    }
}

/// Random 32-character hex token; carries no information about the internal sequence.
pub fn new_transaction_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
