//! Reconciliation pipelines
//!
//! One module per output file. Each module owns the column schema of its
//! file, the functions that turn source records into rows, and an async
//! `run` that drives the join engine over the top-level keys. Pipelines are
//! generic over the source traits so the wiring to real clients happens in
//! the CLI runner.
//!
//! | Pipeline | Keys | File |
//! |---|---|---|
//! | [`increase_transactions`] | payroll-run ids | `increase-transactions.csv` |
//! | [`employer_info`] | employer ids | `employer-business-info.csv` |
//! | [`employer_bank_info`] | employer ids | `employer-bank-info.csv` |
//! | [`worker_bank_info`] | employer ids | `worker-bank-info.csv` |
//! | [`worker_info`] | worker or employer ids | `worker-personal-info.csv` |

pub mod employer_bank_info;
pub mod employer_info;
pub mod increase_transactions;
pub mod worker_bank_info;
pub mod worker_info;

use crate::output::{CsvSink, RecordBuilder, Schema};
use crate::sources::{Address, BankAccount};
use crate::types::FailurePolicy;
use std::path::Path;

/// Static description of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    /// CLI command that runs it
    pub command: &'static str,
    /// File name inside the output directory
    pub output_file: &'static str,
    /// Column layout of the file
    pub schema: Schema,
    /// Policy used when neither the CLI nor the environment picks one
    pub default_policy: FailurePolicy,
}

impl Pipeline {
    /// Policy in effect given an optional override
    pub fn policy(&self, requested: Option<FailurePolicy>) -> FailurePolicy {
        requested.unwrap_or(self.default_policy)
    }

    /// Sink for this pipeline's file under `output_dir`
    pub fn sink(&self, output_dir: &Path) -> CsvSink {
        CsvSink::new(output_dir.join(self.output_file))
    }
}

/// Every pipeline, in `run-all` order
pub const ALL: [&Pipeline; 5] = [
    &increase_transactions::PIPELINE,
    &employer_info::PIPELINE,
    &employer_bank_info::PIPELINE,
    &worker_bank_info::PIPELINE,
    &worker_info::PIPELINE,
];

/// Fill the address columns shared by several schemas
fn set_address<'a>(row: RecordBuilder<'a>, address: Option<&Address>) -> RecordBuilder<'a> {
    let Some(address) = address else {
        return row;
    };
    row.set_opt("address_line1", address.line1.as_deref())
        .set_opt("address_line2", address.line2.as_deref())
        .set_opt("city", address.city.as_deref())
        .set_opt("state", address.state.as_deref())
        .set_opt("postal_code", address.postal_code.as_deref())
}

/// Fill the bank account columns shared by both bank schemas
fn set_bank_account<'a>(row: RecordBuilder<'a>, account: &BankAccount) -> RecordBuilder<'a> {
    row.set("bank_account_id", account.id.as_str())
        .set_opt("bank_name", account.bank_name.as_deref())
        .set_opt("account_type", account.account_type.as_deref())
        .set_opt("routing_number", account.routing_number.as_deref())
        .set_opt("account_number_last4", account.account_number_last4.as_deref())
        .set_opt("status", account.status.as_deref())
}

#[cfg(test)]
mod tests;
