use std::{
    collections::HashMap,
    io::{BufWriter, Read, Write, stdout},
    sync::Arc,
};

use tracing::{debug, info, warn};

use crate::{
    common::{
        config::Policy,
        error::{AppError, TransactionError},
        event::OperationEvent,
    },
    domain::{ledger::Ledger, store::LedgerStore, transaction::TxType, user::AccountUser},
    io::{
        reader::{self, OperationKind, OperationRequest},
        validation, writer,
        writer::ResultRow,
    },
    worker::processor::{Outcome, Processor},
};

pub fn run<I, S>(args: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(|s| s.into()).collect();
    if args.len() < 3 {
        return Err(AppError::MissingArg);
    }

    let policy = match args.get(3) {
        Some(path) => Policy::load(path)?,
        None => Policy::default(),
    };

    let accounts = std::fs::File::open(&args[1])?;
    let operations = std::fs::File::open(&args[2])?;

    let stdout = stdout();
    let out = BufWriter::new(stdout.lock());
    run_batch(accounts, operations, policy, out)
}

/// Seeds the directory from `accounts`, runs every row of `operations` in order
/// and writes one result row per operation to `out`.
pub fn run_batch<A, O, W>(
    accounts: A,
    operations: O,
    policy: Policy,
    out: W,
) -> Result<(), AppError>
where
    A: Read,
    O: Read,
    W: Write,
{
    let ledger = Arc::new(Ledger::with_account_limit(policy.max_accounts_per_user));
    seed_accounts(&ledger, accounts)?;
    let seeded = ledger.accounts().map_err(|e| AppError::Seed(e.to_string()))?;
    info!(accounts = seeded.len(), "accounts seeded");

    let processor = Processor::new(Arc::clone(&ledger), policy);
    let mut session = Session::new(&processor);

    let mut reader = csv_reader(operations);
    let mut rows = Vec::new();
    for request in reader::read_operations(&mut reader) {
        let request = request.map_err(AppError::Parse)?;
        rows.push(session.execute(request));
    }

    info!(operations = rows.len(), "batch finished");
    writer::write_results(out, &rows)?;
    Ok(())
}

fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input)
}

fn seed_accounts<R: Read>(ledger: &Ledger, input: R) -> Result<(), AppError> {
    let mut reader = csv_reader(input);
    for seed in reader::read_accounts(&mut reader) {
        let seed = seed.map_err(AppError::Parse)?;
        let known = ledger
            .find_user_by_id(seed.user)
            .map_err(|e| AppError::Seed(e.to_string()))?
            .is_some();
        if !known {
            let user = AccountUser::new(seed.user, seed.name);
            debug!(user = %user.id, name = %user.name, "user registered");
            ledger
                .insert_user(user)
                .map_err(|e| AppError::Seed(e.to_string()))?;
        }
        ledger
            .insert_account(seed.user, &seed.account_number, seed.status, seed.balance)
            .map_err(|e| AppError::Seed(e.to_string()))?;
    }
    Ok(())
}

/// Per-batch request handling: boundary validation, label translation and
/// recording of failed use/cancel attempts.
struct Session<'a, S: LedgerStore> {
    processor: &'a Processor<S>,
    /// Caller-chosen label on a `use` row -> generated transaction id.
    labels: HashMap<String, String>,
}

impl<'a, S: LedgerStore> Session<'a, S> {
    fn new(processor: &'a Processor<S>) -> Self {
        Self {
            processor,
            labels: HashMap::new(),
        }
    }

    fn execute(&mut self, mut request: OperationRequest) -> ResultRow {
        let op = request.kind.as_str();
        // On a use row the tx cell names the new transaction, it is not an input.
        let label = match request.kind {
            OperationKind::Use => request.tx.take(),
            _ => {
                request.tx = request.tx.map(|tx| self.resolve(tx));
                None
            }
        };

        let event = match validation::validate(&request, self.processor.policy()) {
            Ok(event) => event,
            Err(err) => {
                warn!(op, %err, "request rejected at boundary");
                let amount = request.amount.as_deref().and_then(|a| a.parse().ok());
                return ResultRow::failure(op, request.account.as_deref(), amount, &err);
            }
        };

        match self.processor.process(event.clone()) {
            Ok(Outcome::Completed(receipt)) => {
                if let Some(label) = label {
                    self.labels.insert(label, receipt.transaction_id.clone());
                }
                ResultRow::completed(op, tx_type(request.kind), &receipt)
            }
            Ok(Outcome::Found(details)) => ResultRow::found(op, &details),
            Ok(Outcome::Recorded) => ResultRow::recorded(
                op,
                tx_type(request.kind),
                event.account_number().unwrap_or_default(),
                event.amount().unwrap_or_default(),
            ),
            Err(err) => {
                self.record_failure(&event, &err);
                ResultRow::failure(op, event.account_number(), event.amount(), &err)
            }
        }
    }

    fn resolve(&self, tx: String) -> String {
        self.labels.get(&tx).cloned().unwrap_or(tx)
    }

    /// A rejected use or cancel still leaves a FAIL entry on the account, when it exists.
    fn record_failure(&self, event: &OperationEvent, err: &TransactionError) {
        if matches!(
            err,
            TransactionError::Internal(_) | TransactionError::InvalidRequest(_)
        ) {
            return;
        }
        let recorded = match event {
            OperationEvent::Use {
                account_number,
                amount,
                ..
            } => self.processor.record_failed_use(account_number, *amount),
            OperationEvent::Cancel {
                account_number,
                amount,
                ..
            } => self.processor.record_failed_cancel(account_number, *amount),
            _ => return,
        };
        if let Err(record_err) = recorded {
            warn!(op = event.kind(), code = %record_err.code(), "could not record failed attempt");
        }
    }
}

fn tx_type(kind: OperationKind) -> TxType {
    match kind {
        OperationKind::Cancel | OperationKind::FailCancel => TxType::Cancel,
        _ => TxType::Use,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::money::Money,
        domain::{account::AccountStatus, transaction::TxResult, user::UserId},
    };

    const ACCOUNT: &str = "1000000012";

    fn processor() -> Processor<Ledger> {
        let ledger = Ledger::new();
        ledger.insert_user(AccountUser::new(UserId(12), "Pobi")).unwrap();
        ledger.insert_user(AccountUser::new(UserId(13), "Harry")).unwrap();
        ledger
            .insert_account(UserId(12), ACCOUNT, AccountStatus::Active, Money::new(10_000))
            .unwrap();
        Processor::new(Arc::new(ledger), Policy::default())
    }

    fn request(kind: OperationKind, user: &str, tx: &str, amount: &str) -> OperationRequest {
        let cell = |s: &str| (!s.is_empty()).then(|| s.to_string());
        OperationRequest {
            kind,
            user: cell(user),
            account: Some(ACCOUNT.to_string()),
            tx: cell(tx),
            amount: cell(amount),
        }
    }

    fn fail_entries(p: &Processor<Ledger>) -> Vec<TxType> {
        p.store()
            .transactions_for(ACCOUNT)
            .unwrap()
            .iter()
            .filter(|e| e.result() == TxResult::Fail)
            .map(|e| e.tx_type())
            .collect()
    }

    #[test]
    fn business_failures_leave_a_fail_entry() {
        let p = processor();
        let mut session = Session::new(&p);

        let row = session.execute(request(OperationKind::Use, "13", "", "1000"));
        assert_eq!(row.error_code, Some(crate::common::error::ErrorCode::UserAccountUnmatched));

        session.execute(request(OperationKind::Use, "12", "first", "1000"));
        session.execute(request(OperationKind::Cancel, "", "first", "500"));

        assert_eq!(fail_entries(&p), vec![TxType::Use, TxType::Cancel]);
    }

    #[test]
    fn invalid_requests_are_not_recorded() {
        let p = processor();
        let mut session = Session::new(&p);

        session.execute(request(OperationKind::Use, "12", "", "5"));
        session.execute(request(OperationKind::Cancel, "", "", "1000"));

        assert!(p.store().transactions_for(ACCOUNT).unwrap().is_empty());
    }

    #[test]
    fn labels_resolve_to_generated_ids() {
        let p = processor();
        let mut session = Session::new(&p);

        let used = session.execute(request(OperationKind::Use, "12", "coffee", "1000"));
        let id = used.transaction_id.clone().unwrap();
        assert_ne!(id, "coffee");

        let queried = session.execute(request(OperationKind::Query, "", "coffee", ""));
        assert_eq!(queried.transaction_id, Some(id.clone()));

        // a raw id works as well
        let queried = session.execute(request(OperationKind::Query, "", &id, ""));
        assert_eq!(queried.result, Some(TxResult::Success));
    }
}
