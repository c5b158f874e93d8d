use std::io::Read;

use crate::{
    common::money::Money,
    domain::{account::AccountStatus, user::UserId},
};

#[derive(serde::Deserialize)]
/// Internal CSV row for the account seed file: `user,account,status,balance[,name]`.
struct CsvAccountRow {
    user: u64,
    account: String,
    status: String,
    balance: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(serde::Deserialize)]
/// Internal CSV row for the operations file: `type,user,account,tx,amount`.
/// Columns an operation does not use stay empty.
struct CsvOperationRow {
    #[serde(rename = "type")]
    op_type: String,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    tx: Option<String>,
    #[serde(default)]
    amount: Option<String>,
}

/// An account to load into the directory before operations run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSeed {
    pub user: UserId,
    pub name: String,
    pub account_number: String,
    pub status: AccountStatus,
    pub balance: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Use,
    Cancel,
    Query,
    FailUse,
    FailCancel,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Use => "use",
            OperationKind::Cancel => "cancel",
            OperationKind::Query => "query",
            OperationKind::FailUse => "fail_use",
            OperationKind::FailCancel => "fail_cancel",
        }
    }
}

/// One operation row as typed by the caller; field contents are checked by
/// [`crate::io::validation::validate`], not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub kind: OperationKind,
    pub user: Option<String>,
    pub account: Option<String>,
    pub tx: Option<String>,
    pub amount: Option<String>,
}

/// Reads account seed rows. Status and balance errors include the account number.
///
/// # Examples
///
/// ```
/// use account_ledger::io::reader::read_accounts;
///
/// let data = "user,account,status,balance\n12,1000000012,ACTIVE,100000\n";
/// let mut rdr = csv::ReaderBuilder::new().from_reader(data.as_bytes());
/// let seeds: Vec<_> = read_accounts(&mut rdr).collect();
///
/// let seed = seeds[0].as_ref().unwrap();
/// assert_eq!(seed.account_number, "1000000012");
/// assert_eq!(seed.balance.as_u64(), 100_000);
/// ```
pub fn read_accounts<R: Read>(
    rdr: &mut csv::Reader<R>,
) -> impl Iterator<Item = Result<AccountSeed, String>> + '_ {
    rdr.deserialize::<CsvAccountRow>().map(|res| {
        let row = res.map_err(|e| e.to_string())?;
        let status = row
            .status
            .parse::<AccountStatus>()
            .map_err(|e| format!("{e} for account {}", row.account))?;
        let balance = row
            .balance
            .parse::<Money>()
            .map_err(|e| format!("invalid balance for account {}: {e}", row.account))?;

        Ok(AccountSeed {
            user: UserId(row.user),
            name: row.name.unwrap_or_default(),
            account_number: row.account.trim().to_string(),
            status,
            balance,
        })
    })
}

/// Reads operation rows. Supported types: `use`, `cancel`, `query`, `fail_use`,
/// `fail_cancel` (case-insensitive). Blank cells become `None`.
///
/// # Examples
///
/// ```
/// use account_ledger::io::reader::{read_operations, OperationKind};
///
/// let data = "type,user,account,tx,amount\nuse,12,1000000012,a,1000\nquery,,,a,\n";
/// let mut rdr = csv::ReaderBuilder::new().from_reader(data.as_bytes());
/// let ops: Vec<_> = read_operations(&mut rdr).collect();
///
/// assert_eq!(ops[0].as_ref().unwrap().kind, OperationKind::Use);
/// assert_eq!(ops[1].as_ref().unwrap().amount, None);
/// ```
pub fn read_operations<R: Read>(
    rdr: &mut csv::Reader<R>,
) -> impl Iterator<Item = Result<OperationRequest, String>> + '_ {
    rdr.deserialize::<CsvOperationRow>().map(|res| {
        let row = res.map_err(|e| e.to_string())?;
        let kind = match row.op_type.trim().to_ascii_lowercase().as_str() {
            "use" => OperationKind::Use,
            "cancel" => OperationKind::Cancel,
            "query" => OperationKind::Query,
            "fail_use" => OperationKind::FailUse,
            "fail_cancel" => OperationKind::FailCancel,
            other => return Err(format!("unknown operation type: {other}")),
        };

        Ok(OperationRequest {
            kind,
            user: non_blank(row.user),
            account: non_blank(row.account),
            tx: non_blank(row.tx),
            amount: non_blank(row.amount),
        })
    })
}

fn non_blank(cell: Option<String>) -> Option<String> {
    cell.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
