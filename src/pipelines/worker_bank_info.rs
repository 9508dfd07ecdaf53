//! Worker bank accounts, by employer
//!
//! Each employer's roster comes from the entity API; the accounts of every
//! rostered worker are then fetched from the graph database in one bulk
//! query. A worker without accounts still gets a row, with the bank columns
//! left empty.

use super::{set_bank_account, Pipeline};
use crate::engine::JoinEngine;
use crate::error::Result;
use crate::lookup::BatchLookup;
use crate::output::{OutputRecord, Schema};
use crate::sources::{BankAccount, BatchSource, EmployerWithWorkers, Source, Worker};
use crate::types::{FailurePolicy, QueryKey};
use tracing::info;

/// Column layout of `worker-bank-info.csv`
pub const SCHEMA: Schema = Schema::new(&[
    ("employer_id", "Employer ID"),
    ("worker_id", "Worker ID"),
    ("first_name", "First Name"),
    ("last_name", "Last Name"),
    ("bank_account_id", "Bank Account ID"),
    ("bank_name", "Bank Name"),
    ("account_type", "Account Type"),
    ("routing_number", "Routing Number"),
    ("account_number_last4", "Account Number (last 4)"),
    ("status", "Status"),
]);

pub const PIPELINE: Pipeline = Pipeline {
    command: "get-worker-bank-info",
    output_file: "worker-bank-info.csv",
    schema: SCHEMA,
    default_policy: FailurePolicy::Lenient,
};

/// A worker together with the employer whose roster listed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosteredWorker {
    pub employer_id: String,
    pub worker: Worker,
}

/// Flatten an employer roster into one entry per worker
pub fn roster_entries(roster: EmployerWithWorkers) -> Vec<RosteredWorker> {
    let employer_id = roster.employer.id;
    roster
        .workers
        .into_iter()
        .map(|worker| RosteredWorker {
            employer_id: employer_id.clone(),
            worker,
        })
        .collect()
}

pub fn worker_account_row(entry: &RosteredWorker, account: Option<&BankAccount>) -> OutputRecord {
    let row = SCHEMA
        .record()
        .set("employer_id", entry.employer_id.as_str())
        .set("worker_id", entry.worker.id.as_str())
        .set_opt("first_name", entry.worker.first_name.as_deref())
        .set_opt("last_name", entry.worker.last_name.as_deref());
    match account {
        Some(account) => set_bank_account(row, account).build(),
        None => row.build(),
    }
}

/// Rows of one worker: one per account, or a single row without bank data
fn worker_rows(entry: &RosteredWorker, accounts: Option<&Vec<BankAccount>>) -> Vec<OutputRecord> {
    match accounts {
        Some(accounts) if !accounts.is_empty() => accounts
            .iter()
            .map(|account| worker_account_row(entry, Some(account)))
            .collect(),
        _ => vec![worker_account_row(entry, None)],
    }
}

/// Bank account rows of every worker of every employer
pub async fn run<R, B>(
    engine: &mut JoinEngine,
    employer_ids: &[QueryKey],
    rosters: &R,
    worker_accounts: &B,
) -> Result<Vec<OutputRecord>>
where
    R: Source<Record = EmployerWithWorkers>,
    B: BatchSource<Value = Vec<BankAccount>>,
{
    let entries = engine
        .collect(employer_ids, rosters, |_, roster| roster_entries(roster))
        .await?;

    if entries.is_empty() {
        info!("no workers found, skipping bank account lookup");
        return Ok(Vec::new());
    }

    let index = BatchLookup::build(
        worker_accounts,
        entries.iter().map(|e| e.worker.id.clone()),
    )
    .await;
    info!(
        workers = entries.len(),
        with_accounts = index.len(),
        "resolved worker bank accounts"
    );

    Ok(entries
        .iter()
        .flat_map(|entry| worker_rows(entry, index.get(&entry.worker.id)))
        .collect())
}
