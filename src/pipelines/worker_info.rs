//! Worker personal information
//!
//! Workers are selected either by their own ids or by employer. The two
//! selections use different entity operations but produce the same rows.

use super::{set_address, Pipeline};
use crate::engine::JoinEngine;
use crate::error::Result;
use crate::output::{OutputRecord, Schema};
use crate::sources::{Source, Worker};
use crate::types::{FailurePolicy, QueryKey};

/// Column layout of `worker-personal-info.csv`
pub const SCHEMA: Schema = Schema::new(&[
    ("worker_id", "Worker ID"),
    ("employer_id", "Employer ID"),
    ("first_name", "First Name"),
    ("last_name", "Last Name"),
    ("email", "Email"),
    ("phone", "Phone"),
    ("date_of_birth", "Date of Birth"),
    ("employment_type", "Employment Type"),
    ("status", "Status"),
    ("start_date", "Start Date"),
    ("address_line1", "Address Line 1"),
    ("address_line2", "Address Line 2"),
    ("city", "City"),
    ("state", "State"),
    ("postal_code", "Postal Code"),
]);

pub const PIPELINE: Pipeline = Pipeline {
    command: "get-worker-info",
    output_file: "worker-personal-info.csv",
    schema: SCHEMA,
    default_policy: FailurePolicy::Lenient,
};

/// How the workers to report are chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerSelection {
    /// Explicit worker ids
    Workers(Vec<QueryKey>),
    /// Every worker of these employers
    Employers(Vec<QueryKey>),
}

impl WorkerSelection {
    pub fn keys(&self) -> &[QueryKey] {
        match self {
            Self::Workers(ids) | Self::Employers(ids) => ids,
        }
    }
}

/// Row for one worker; `employer_id` fills in when the record has none
pub fn worker_row(worker: &Worker, employer_id: Option<&str>) -> OutputRecord {
    let row = SCHEMA
        .record()
        .set("worker_id", worker.id.as_str())
        .set_opt("employer_id", worker.employer_id.as_deref().or(employer_id))
        .set_opt("first_name", worker.first_name.as_deref())
        .set_opt("last_name", worker.last_name.as_deref())
        .set_opt("email", worker.email.as_deref())
        .set_opt("phone", worker.phone.as_deref())
        .set_opt("date_of_birth", worker.date_of_birth.as_deref())
        .set_opt("employment_type", worker.employment_type.as_deref())
        .set_opt("status", worker.status.as_deref())
        .set_opt("start_date", worker.start_date.as_deref());
    set_address(row, worker.address.as_ref()).build()
}

/// One row per worker id
pub async fn run_for_workers<S>(
    engine: &mut JoinEngine,
    worker_ids: &[QueryKey],
    workers: &S,
) -> Result<Vec<OutputRecord>>
where
    S: Source<Record = Worker>,
{
    engine
        .collect(worker_ids, workers, |_, worker| vec![worker_row(&worker, None)])
        .await
}

/// One row per worker of every employer
pub async fn run_for_employers<S>(
    engine: &mut JoinEngine,
    employer_ids: &[QueryKey],
    employer_workers: &S,
) -> Result<Vec<OutputRecord>>
where
    S: Source<Record = Worker>,
{
    engine
        .collect(employer_ids, employer_workers, |employer_id, worker| {
            vec![worker_row(&worker, Some(employer_id))]
        })
        .await
}
