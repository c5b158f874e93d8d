use crate::{common::money::Money, domain::user::UserId};

/// Represents an operation request that is sent from the reader to the worker for processing.
///
/// Only validated primitives travel here; labels and raw CSV text stay at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationEvent {
    Use {
        user: UserId,
        account_number: String,
        amount: Money,
    },
    Cancel {
        transaction_id: String,
        account_number: String,
        amount: Money,
    },
    Query {
        transaction_id: String,
    },
    FailedUse {
        account_number: String,
        amount: Money,
    },
    FailedCancel {
        account_number: String,
        amount: Money,
    },
}

impl OperationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            OperationEvent::Use { .. } => "use",
            OperationEvent::Cancel { .. } => "cancel",
            OperationEvent::Query { .. } => "query",
            OperationEvent::FailedUse { .. } => "fail_use",
            OperationEvent::FailedCancel { .. } => "fail_cancel",
        }
    }

    /// Account the operation targets, when the request names one.
    pub fn account_number(&self) -> Option<&str> {
        match self {
            OperationEvent::Use { account_number, .. }
            | OperationEvent::Cancel { account_number, .. }
            | OperationEvent::FailedUse { account_number, .. }
            | OperationEvent::FailedCancel { account_number, .. } => Some(account_number),
            OperationEvent::Query { .. } => None,
        }
    }

    pub fn amount(&self) -> Option<Money> {
        match self {
            OperationEvent::Use { amount, .. }
            | OperationEvent::Cancel { amount, .. }
            | OperationEvent::FailedUse { amount, .. }
            | OperationEvent::FailedCancel { amount, .. } => Some(*amount),
            OperationEvent::Query { .. } => None,
        }
    }
}
