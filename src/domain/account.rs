use crate::{
    common::{error::TransactionError, money::Money},
    domain::user::UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    /// Terminal: no further debits are accepted.
    Unregistered,
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" | "IN_USE" => Ok(AccountStatus::Active),
            "UNREGISTERED" => Ok(AccountStatus::Unregistered),
            other => Err(format!("unknown account status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub owner: UserId,
    /// External, client-facing account number.
    pub account_number: String,
    pub status: AccountStatus,
    pub balance: Money,
}

impl Account {
    pub fn new(
        id: AccountId,
        owner: UserId,
        account_number: impl Into<String>,
        status: AccountStatus,
        balance: Money,
    ) -> Self {
        Self {
            id,
            owner,
            account_number: account_number.into(),
            status,
            balance,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }

    /// Debit guard: the only way a balance goes down. Leaves the balance untouched on failure.
    pub fn debit(&mut self, amount: Money) -> Result<(), TransactionError> {
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(TransactionError::AmountExceedsBalance)?;
        Ok(())
    }

    pub fn credit(&mut self, amount: Money) -> Result<(), TransactionError> {
        self.balance = self.balance.checked_add(amount).ok_or_else(|| {
            TransactionError::Internal(format!(
                "balance overflow on account {}",
                self.account_number
            ))
        })?;
        Ok(())
    }
}
