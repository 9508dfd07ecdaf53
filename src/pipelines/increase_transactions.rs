//! Payment orders joined with their Increase ACH transfers
//!
//! For each payroll run, every payment order carrying a
//! `bnk_dev_transfer_id` reference is matched to the ACH transfer with that
//! id. Orders without the reference are skipped.

use super::Pipeline;
use crate::engine::JoinEngine;
use crate::error::Result;
use crate::output::{OutputRecord, Schema};
use crate::sources::{AchTransfer, Lookup, PaymentOrder, Source, TRANSFER_ID_REFERENCE_TYPE};
use crate::types::{FailurePolicy, QueryKey};

/// Column layout of `increase-transactions.csv`
pub const SCHEMA: Schema = Schema::new(&[
    ("payroll_run_id", "Payroll Run ID"),
    ("payment_order_id", "Payment Order ID"),
    ("amount", "Amount"),
    ("direction", "Direction"),
    ("effective_date", "Effective Date"),
    ("transfer_id", "Transfer ID"),
    ("transfer_amount", "Transfer Amount"),
    ("transaction_id", "Transaction ID"),
]);

pub const PIPELINE: Pipeline = Pipeline {
    command: "get-increase-transaction",
    output_file: "increase-transactions.csv",
    schema: SCHEMA,
    default_policy: FailurePolicy::Lenient,
};

/// Increase transfer id referenced by a payment order
pub fn transfer_id(order: &PaymentOrder) -> Option<String> {
    order
        .reference(TRANSFER_ID_REFERENCE_TYPE)
        .map(String::from)
}

/// One row per joined order and transfer
pub fn transaction_row(
    payroll_run_id: &str,
    order: &PaymentOrder,
    transfer: AchTransfer,
) -> OutputRecord {
    SCHEMA
        .record()
        .set("payroll_run_id", payroll_run_id)
        .set("payment_order_id", order.id.as_str())
        .set("amount", order.amount.to_string())
        .set("direction", order.direction.as_str())
        .set("effective_date", order.effective_date.to_string())
        .set("transfer_id", transfer.id)
        .set("transfer_amount", transfer.amount.to_string())
        .set_opt("transaction_id", transfer.transaction_id)
        .build()
}

/// Join the payment orders of every payroll run with their transfers
pub async fn run<P, T>(
    engine: &mut JoinEngine,
    payroll_run_ids: &[QueryKey],
    orders: &P,
    transfers: &T,
) -> Result<Vec<OutputRecord>>
where
    P: Source<Record = PaymentOrder>,
    T: Lookup<Record = AchTransfer>,
{
    engine
        .join(payroll_run_ids, orders, transfers, transfer_id, transaction_row)
        .await
}
