use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    common::{
        error::{ErrorCode, TransactionError},
        money::Money,
    },
    domain::transaction::{TxResult, TxType},
    worker::processor::{TransactionDetails, TransactionReceipt},
};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
/// CSV output row, one per operation, success or failure.
///
/// Headers written (in this order):
/// `type,account,transaction_type,result,transaction_id,amount,balance_snapshot,transacted_at,error_code,error_message`.
/// Columns that do not apply to a row are left empty.
pub struct ResultRow {
    #[serde(rename = "type")]
    pub op_type: &'static str,
    pub account: Option<String>,
    pub transaction_type: Option<TxType>,
    pub result: Option<TxResult>,
    pub transaction_id: Option<String>,
    pub amount: Option<Money>,
    pub balance_snapshot: Option<Money>,
    pub transacted_at: Option<String>,
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
}

impl ResultRow {
    fn empty(op_type: &'static str) -> Self {
        Self {
            op_type,
            account: None,
            transaction_type: None,
            result: None,
            transaction_id: None,
            amount: None,
            balance_snapshot: None,
            transacted_at: None,
            error_code: None,
            error_message: None,
        }
    }

    pub fn completed(op_type: &'static str, tx_type: TxType, receipt: &TransactionReceipt) -> Self {
        Self {
            account: Some(receipt.account_number.clone()),
            transaction_type: Some(tx_type),
            result: Some(receipt.result),
            transaction_id: Some(receipt.transaction_id.clone()),
            amount: Some(receipt.amount),
            balance_snapshot: Some(receipt.balance_snapshot),
            transacted_at: Some(timestamp(receipt.transacted_at)),
            ..Self::empty(op_type)
        }
    }

    pub fn found(op_type: &'static str, details: &TransactionDetails) -> Self {
        Self {
            account: Some(details.account_number.clone()),
            transaction_type: Some(details.transaction_type),
            result: Some(details.result),
            transaction_id: Some(details.transaction_id.clone()),
            amount: Some(details.amount),
            balance_snapshot: Some(details.balance_snapshot),
            transacted_at: Some(timestamp(details.transacted_at)),
            ..Self::empty(op_type)
        }
    }

    pub fn recorded(op_type: &'static str, tx_type: TxType, account: &str, amount: Money) -> Self {
        Self {
            account: Some(account.to_string()),
            transaction_type: Some(tx_type),
            result: Some(TxResult::Fail),
            amount: Some(amount),
            ..Self::empty(op_type)
        }
    }

    pub fn failure(
        op_type: &'static str,
        account: Option<&str>,
        amount: Option<Money>,
        err: &TransactionError,
    ) -> Self {
        Self {
            account: account.map(str::to_string),
            amount,
            error_code: Some(err.code()),
            error_message: Some(err.message()),
            ..Self::empty(op_type)
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Writes result rows to a CSV writer, in the order given.
///
/// # Errors
///
/// Returns a `csv::Error` if writing/serializing any row fails.
///
/// # Examples
///
/// ```
/// use account_ledger::common::error::TransactionError;
/// use account_ledger::io::writer::{write_results, ResultRow};
///
/// let err = TransactionError::UserNotFound;
/// let rows = vec![ResultRow::failure("use", Some("1000000012"), None, &err)];
/// let mut out = Vec::new();
/// write_results(&mut out, &rows).unwrap();
///
/// let s = String::from_utf8(out).unwrap();
/// assert!(s.starts_with("type,account,transaction_type,result,"));
/// assert!(s.contains("USER_NOT_FOUND"));
/// ```
pub fn write_results<W: Write>(writer: W, rows: &[ResultRow]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    for row in rows {
        wtr.serialize(row)?;
    }

    wtr.flush()?;
    Ok(())
}
