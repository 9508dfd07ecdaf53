//! Employer business information

use super::{set_address, Pipeline};
use crate::engine::JoinEngine;
use crate::error::Result;
use crate::output::{OutputRecord, Schema};
use crate::sources::{Employer, Source};
use crate::types::{FailurePolicy, QueryKey};

/// Column layout of `employer-business-info.csv`
pub const SCHEMA: Schema = Schema::new(&[
    ("employer_id", "Employer ID"),
    ("legal_name", "Legal Name"),
    ("trade_name", "Trade Name"),
    ("ein", "EIN"),
    ("entity_type", "Entity Type"),
    ("email", "Email"),
    ("phone", "Phone"),
    ("status", "Status"),
    ("address_line1", "Address Line 1"),
    ("address_line2", "Address Line 2"),
    ("city", "City"),
    ("state", "State"),
    ("postal_code", "Postal Code"),
]);

/// An unknown employer id aborts the run, so a partial file is never written
pub const PIPELINE: Pipeline = Pipeline {
    command: "get-employer-info",
    output_file: "employer-business-info.csv",
    schema: SCHEMA,
    default_policy: FailurePolicy::Strict,
};

pub fn employer_row(employer: &Employer) -> OutputRecord {
    let row = SCHEMA
        .record()
        .set("employer_id", employer.id.as_str())
        .set_opt("legal_name", employer.legal_name.as_deref())
        .set_opt("trade_name", employer.trade_name.as_deref())
        .set_opt("ein", employer.ein.as_deref())
        .set_opt("entity_type", employer.entity_type.as_deref())
        .set_opt("email", employer.email.as_deref())
        .set_opt("phone", employer.phone.as_deref())
        .set_opt("status", employer.status.as_deref());
    set_address(row, employer.address.as_ref()).build()
}

/// One row per employer id
///
/// `employers` yields exactly one record per id, usually a
/// [`Single`](crate::sources::Single) over the employer lookup.
pub async fn run<S>(
    engine: &mut JoinEngine,
    employer_ids: &[QueryKey],
    employers: &S,
) -> Result<Vec<OutputRecord>>
where
    S: Source<Record = Employer>,
{
    engine
        .collect(employer_ids, employers, |_, employer| {
            vec![employer_row(&employer)]
        })
        .await
}
