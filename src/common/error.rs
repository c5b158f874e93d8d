use std::fmt;

use serde::Serialize;

use crate::domain::user::UserId;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(
        "missing input path. usage: cargo run -- <accounts.csv> <operations.csv> [policy.toml]"
    )]
    MissingArg,
    #[error("failed to open input file: {0}")]
    OpenInput(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("seed error: {0}")]
    Seed(String),
}

/// Stable, client-visible kind of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UserNotFound,
    AccountNotFound,
    UserAccountUnmatched,
    AccountAlreadyUnregistered,
    AmountExceedsBalance,
    TransactionNotFound,
    TransactionAccountUnmatched,
    CancelMustBeFull,
    TooOldToCancel,
    TransactionNotCancellable,
    TransactionAlreadyCancelled,
    InvalidRequest,
    AccountTransactionLock,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::AccountNotFound => "ACCOUNT_NOT_FOUND",
            ErrorCode::UserAccountUnmatched => "USER_ACCOUNT_UNMATCHED",
            ErrorCode::AccountAlreadyUnregistered => "ACCOUNT_ALREADY_UNREGISTERED",
            ErrorCode::AmountExceedsBalance => "AMOUNT_EXCEEDS_BALANCE",
            ErrorCode::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            ErrorCode::TransactionAccountUnmatched => "TRANSACTION_ACCOUNT_UNMATCHED",
            ErrorCode::CancelMustBeFull => "CANCEL_MUST_BE_FULL",
            ErrorCode::TooOldToCancel => "TOO_OLD_TO_CANCEL",
            ErrorCode::TransactionNotCancellable => "TRANSACTION_NOT_CANCELLABLE",
            ErrorCode::TransactionAlreadyCancelled => "TRANSACTION_ALREADY_CANCELLED",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::AccountTransactionLock => "ACCOUNT_TRANSACTION_LOCK",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way a processor operation can fail.
///
/// Business-rule violations carry no payload: the caller already knows the
/// inputs. `Internal` keeps the underlying cause for logging only; use
/// [`TransactionError::message`] for anything shown to a caller.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("user not found")]
    UserNotFound,
    #[error("account not found")]
    AccountNotFound,
    #[error("account is not owned by the user")]
    UserAccountUnmatched,
    #[error("account is already unregistered")]
    AccountAlreadyUnregistered,
    #[error("amount exceeds balance")]
    AmountExceedsBalance,
    #[error("transaction not found")]
    TransactionNotFound,
    #[error("transaction does not belong to the account")]
    TransactionAccountUnmatched,
    #[error("partial cancellation is not allowed")]
    CancelMustBeFull,
    #[error("transaction is too old to cancel")]
    TooOldToCancel,
    #[error("only a successful use can be cancelled")]
    TransactionNotCancellable,
    #[error("transaction is already cancelled")]
    TransactionAlreadyCancelled,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("account {account_number} is busy with another transaction")]
    LockTimeout { account_number: String },
    #[error("internal error: {0}")]
    Internal(String),
}

impl TransactionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TransactionError::UserNotFound => ErrorCode::UserNotFound,
            TransactionError::AccountNotFound => ErrorCode::AccountNotFound,
            TransactionError::UserAccountUnmatched => ErrorCode::UserAccountUnmatched,
            TransactionError::AccountAlreadyUnregistered => ErrorCode::AccountAlreadyUnregistered,
            TransactionError::AmountExceedsBalance => ErrorCode::AmountExceedsBalance,
            TransactionError::TransactionNotFound => ErrorCode::TransactionNotFound,
            TransactionError::TransactionAccountUnmatched => {
                ErrorCode::TransactionAccountUnmatched
            }
            TransactionError::CancelMustBeFull => ErrorCode::CancelMustBeFull,
            TransactionError::TooOldToCancel => ErrorCode::TooOldToCancel,
            TransactionError::TransactionNotCancellable => ErrorCode::TransactionNotCancellable,
            TransactionError::TransactionAlreadyCancelled => {
                ErrorCode::TransactionAlreadyCancelled
            }
            TransactionError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            TransactionError::LockTimeout { .. } => ErrorCode::AccountTransactionLock,
            TransactionError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Human-readable message safe to hand back to a caller.
    pub fn message(&self) -> String {
        match self {
            TransactionError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Only lock contention is worth retrying; business-rule failures will fail again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransactionError::LockTimeout { .. })
    }
}

/// Failures raised by the persistence collaborators.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("transaction id {0} already exists")]
    DuplicateTransactionId(String),
    #[error("account {0} does not exist")]
    UnknownAccount(String),
    #[error("account number {0} already exists")]
    DuplicateAccountNumber(String),
    #[error("transaction {0} is already reversed")]
    AlreadyReversed(String),
    #[error("user {user} already holds {limit} accounts")]
    AccountLimitReached { user: UserId, limit: usize },
    #[error("store lock poisoned")]
    Poisoned,
}

impl From<StoreError> for TransactionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyReversed(_) => TransactionError::TransactionAlreadyCancelled,
            other => TransactionError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_render_as_screaming_snake_case() {
        assert_eq!(
            TransactionError::CancelMustBeFull.code().to_string(),
            "CANCEL_MUST_BE_FULL"
        );
        assert_eq!(
            TransactionError::UserAccountUnmatched.code().as_str(),
            "USER_ACCOUNT_UNMATCHED"
        );
        let field = csv_field(ErrorCode::TooOldToCancel);
        assert_eq!(field, "TOO_OLD_TO_CANCEL");
    }

    // csv serializes unit variants through serde, which is what the writer relies on.
    fn csv_field(code: ErrorCode) -> String {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        wtr.serialize([code]).unwrap();
        let bytes = wtr.into_inner().unwrap();
        String::from_utf8(bytes).unwrap().trim().to_string()
    }

    #[test]
    fn internal_errors_hide_their_cause() {
        let err: TransactionError = StoreError::DuplicateTransactionId("abc".into()).into();
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(err.message(), "internal server error");
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn reversal_conflict_from_store_keeps_its_code() {
        let err: TransactionError = StoreError::AlreadyReversed("abc".into()).into();
        assert_eq!(err, TransactionError::TransactionAlreadyCancelled);
        assert_eq!(err.code().as_str(), "TRANSACTION_ALREADY_CANCELLED");
    }

    #[test]
    fn only_lock_timeout_is_retryable() {
        let busy = TransactionError::LockTimeout {
            account_number: "1000000012".into(),
        };
        assert!(busy.is_retryable());
        assert_eq!(busy.code(), ErrorCode::AccountTransactionLock);
        assert!(!TransactionError::AmountExceedsBalance.is_retryable());
        assert!(!TransactionError::Internal("x".into()).is_retryable());
    }
}
