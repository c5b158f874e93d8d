use crate::{
    common::{config::Policy, error::TransactionError, event::OperationEvent, money::Money},
    domain::user::UserId,
    io::reader::{OperationKind, OperationRequest},
};

/// Checks an operation row and turns it into the primitives the processor takes.
///
/// Every failure is an `INVALID_REQUEST`; nothing invalid reaches the core.
pub fn validate(
    req: &OperationRequest,
    policy: &Policy,
) -> Result<OperationEvent, TransactionError> {
    match req.kind {
        OperationKind::Use => Ok(OperationEvent::Use {
            user: user_id(req.user.as_deref())?,
            account_number: account_number(req.account.as_deref(), policy)?,
            amount: amount(req.amount.as_deref(), policy)?,
        }),
        OperationKind::Cancel => Ok(OperationEvent::Cancel {
            transaction_id: transaction_id(req.tx.as_deref())?,
            account_number: account_number(req.account.as_deref(), policy)?,
            amount: amount(req.amount.as_deref(), policy)?,
        }),
        OperationKind::Query => Ok(OperationEvent::Query {
            transaction_id: transaction_id(req.tx.as_deref())?,
        }),
        OperationKind::FailUse => Ok(OperationEvent::FailedUse {
            account_number: account_number(req.account.as_deref(), policy)?,
            amount: amount(req.amount.as_deref(), policy)?,
        }),
        OperationKind::FailCancel => Ok(OperationEvent::FailedCancel {
            account_number: account_number(req.account.as_deref(), policy)?,
            amount: amount(req.amount.as_deref(), policy)?,
        }),
    }
}

fn invalid(msg: impl Into<String>) -> TransactionError {
    TransactionError::InvalidRequest(msg.into())
}

fn user_id(raw: Option<&str>) -> Result<UserId, TransactionError> {
    let raw = raw.ok_or_else(|| invalid("user is required"))?;
    match raw.parse::<u64>() {
        Ok(id) if id >= 1 => Ok(UserId(id)),
        _ => Err(invalid(format!("user must be a positive integer, got {raw}"))),
    }
}

fn account_number(raw: Option<&str>, policy: &Policy) -> Result<String, TransactionError> {
    let raw = raw.ok_or_else(|| invalid("account is required"))?;
    if raw.chars().count() != policy.account_number_len {
        return Err(invalid(format!(
            "account must be exactly {} characters, got {raw}",
            policy.account_number_len
        )));
    }
    Ok(raw.to_string())
}

fn amount(raw: Option<&str>, policy: &Policy) -> Result<Money, TransactionError> {
    let raw = raw.ok_or_else(|| invalid("amount is required"))?;
    let amount = raw
        .parse::<Money>()
        .map_err(|_| invalid(format!("amount must be a non-negative integer, got {raw}")))?;
    if !policy.amount_in_bounds(amount) {
        return Err(invalid(format!(
            "amount must be between {} and {}, got {amount}",
            policy.min_amount, policy.max_amount
        )));
    }
    Ok(amount)
}

fn transaction_id(raw: Option<&str>) -> Result<String, TransactionError> {
    raw.map(str::to_string)
        .ok_or_else(|| invalid("tx is required"))
}
