use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::common::{error::AppError, money::Money};

/// Policy constants for the transaction processor and the input boundary.
///
/// Every field has a default, so a TOML file only needs the keys it overrides:
///
/// ```
/// use account_ledger::common::config::Policy;
///
/// let policy = Policy::from_toml_str("cancel_window_months = 6").unwrap();
/// assert_eq!(policy.cancel_window_months, 6);
/// assert_eq!(policy.min_amount, 10);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Smallest amount a single use or cancel may carry.
    pub min_amount: u64,
    /// Largest amount a single use or cancel may carry.
    pub max_amount: u64,
    /// How far back, in months, a use can still be cancelled.
    pub cancel_window_months: u32,
    /// How long to wait for another operation on the same account to finish.
    pub lock_wait_ms: u64,
    /// Exact length of an external account number.
    pub account_number_len: usize,
    /// How many accounts a single user may hold.
    pub max_accounts_per_user: usize,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            min_amount: 10,
            max_amount: 1_000_000_000,
            cancel_window_months: 12,
            lock_wait_ms: 1_000,
            account_number_len: 10,
            max_accounts_per_user: 10,
        }
    }
}

impl Policy {
    pub fn from_toml_str(s: &str) -> Result<Self, AppError> {
        let policy: Policy = toml::from_str(s).map_err(|e| AppError::Config(e.to_string()))?;
        policy.check()?;
        Ok(policy)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }

    pub fn amount_in_bounds(&self, amount: Money) -> bool {
        (self.min_amount..=self.max_amount).contains(&amount.as_u64())
    }

    fn check(&self) -> Result<(), AppError> {
        if self.min_amount == 0 {
            return Err(AppError::Config("min_amount must be positive".into()));
        }
        if self.min_amount > self.max_amount {
            return Err(AppError::Config(format!(
                "min_amount {} exceeds max_amount {}",
                self.min_amount, self.max_amount
            )));
        }
        if self.account_number_len == 0 {
            return Err(AppError::Config("account_number_len must be positive".into()));
        }
        if self.max_accounts_per_user == 0 {
            return Err(AppError::Config("max_accounts_per_user must be positive".into()));
        }
        Ok(())
    }
}
