//! Employer bank accounts with their authorizers
//!
//! Accounts are collected per employer first; authorizers for all of them
//! are then resolved with one bulk query. An account whose authorizer is
//! unknown, or whose bulk query failed, gets the literal `null` in every
//! authorizer column.

use super::{set_bank_account, Pipeline};
use crate::engine::JoinEngine;
use crate::error::Result;
use crate::lookup::BatchLookup;
use crate::output::{OutputRecord, Schema};
use crate::sources::{Authorizer, BankAccount, BatchSource, Source};
use crate::types::{FailurePolicy, QueryKey};
use tracing::info;

/// Placeholder written in authorizer columns when there is no authorizer
pub const MISSING_AUTHORIZER: &str = "null";

/// Column layout of `employer-bank-info.csv`
pub const SCHEMA: Schema = Schema::new(&[
    ("employer_id", "Employer ID"),
    ("bank_account_id", "Bank Account ID"),
    ("bank_name", "Bank Name"),
    ("account_type", "Account Type"),
    ("routing_number", "Routing Number"),
    ("account_number_last4", "Account Number (last 4)"),
    ("status", "Status"),
    ("authorizer_name", "Authorizer Name"),
    ("authorizer_email", "Authorizer Email"),
    ("authorizer_ip_address", "Authorizer IP Address"),
    ("authorized_at", "Authorized At"),
]);

pub const PIPELINE: Pipeline = Pipeline {
    command: "get-employer-bank-info",
    output_file: "employer-bank-info.csv",
    schema: SCHEMA,
    default_policy: FailurePolicy::Lenient,
};

/// Account of an employer, before enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployerAccount {
    pub employer_id: String,
    pub account: BankAccount,
}

pub fn bank_account_row(
    employer_id: &str,
    account: &BankAccount,
    authorizer: Option<&Authorizer>,
) -> OutputRecord {
    let row = set_bank_account(SCHEMA.record().set("employer_id", employer_id), account);

    // Present authorizers keep empty strings for fields they lack
    let row = match authorizer {
        Some(a) => row
            .set_opt("authorizer_name", a.name.as_deref())
            .set_opt("authorizer_email", a.email.as_deref())
            .set_opt("authorizer_ip_address", a.ip_address.as_deref())
            .set_opt("authorized_at", a.authorized_at.as_deref()),
        None => row
            .set("authorizer_name", MISSING_AUTHORIZER)
            .set("authorizer_email", MISSING_AUTHORIZER)
            .set("authorizer_ip_address", MISSING_AUTHORIZER)
            .set("authorized_at", MISSING_AUTHORIZER),
    };
    row.build()
}

/// One row per bank account of every employer
pub async fn run<A, Z>(
    engine: &mut JoinEngine,
    employer_ids: &[QueryKey],
    accounts: &A,
    authorizers: &Z,
) -> Result<Vec<OutputRecord>>
where
    A: Source<Record = BankAccount>,
    Z: BatchSource<Value = Authorizer>,
{
    let linked = engine
        .collect(employer_ids, accounts, |employer_id, account| {
            vec![EmployerAccount {
                employer_id: employer_id.to_string(),
                account,
            }]
        })
        .await?;

    if linked.is_empty() {
        info!("no bank accounts found, skipping authorizer lookup");
        return Ok(Vec::new());
    }

    let index =
        BatchLookup::build(authorizers, linked.iter().map(|l| l.account.id.clone())).await;
    info!(
        accounts = linked.len(),
        with_authorizer = index.len(),
        "resolved authorizers"
    );

    Ok(linked
        .iter()
        .map(|l| bank_account_row(&l.employer_id, &l.account, index.get(&l.account.id)))
        .collect())
}
