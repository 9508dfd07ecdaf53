//! Tests for pipelines module

use super::*;
use crate::engine::{EngineConfig, JoinEngine};
use crate::error::{Error, Result};
use crate::output::OutputRecord;
use crate::sources::{
    AchTransfer, Authorizer, BankAccount, BatchSource, Employer, EmployerSummary,
    EmployerWithWorkers, Lookup, PaymentOrder, ReferenceNumber, Source, Worker,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Mutex;
use test_case::test_case;

// ============================================================================
// Fakes
// ============================================================================

/// Records per key; keys listed in `failing` return an upstream error
struct Fixed<R> {
    records: HashMap<String, Vec<R>>,
    failing: Vec<String>,
}

impl<R> Fixed<R> {
    fn new() -> Self {
        Self {
            records: HashMap::new(),
            failing: Vec::new(),
        }
    }

    fn with(mut self, key: &str, records: Vec<R>) -> Self {
        self.records.insert(key.to_string(), records);
        self
    }

    fn failing(mut self, key: &str) -> Self {
        self.failing.push(key.to_string());
        self
    }
}

#[async_trait]
impl<R: Clone + Send + Sync> Source for Fixed<R> {
    type Record = R;

    fn name(&self) -> &str {
        "fixed"
    }

    async fn fetch(&self, key: &str) -> Result<Vec<R>> {
        if self.failing.iter().any(|k| k == key) {
            return Err(Error::status("fixed", 500, "boom"));
        }
        self.records
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found("fixed", "record", key))
    }
}

struct Transfers(HashMap<String, AchTransfer>);

#[async_trait]
impl Lookup for Transfers {
    type Record = AchTransfer;

    fn name(&self) -> &str {
        "transfers"
    }

    async fn lookup(&self, key: &str) -> Result<AchTransfer> {
        self.0
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found("transfers", "transfer", key))
    }
}

/// Bulk source recording every batch it is asked for
struct Batch<V> {
    values: HashMap<String, V>,
    fail: bool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl<V> Batch<V> {
    fn new(values: Vec<(&str, V)>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn broken() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl<V: Clone + Send + Sync> BatchSource for Batch<V> {
    type Value = V;

    fn name(&self) -> &str {
        "batch"
    }

    async fn fetch_batch(&self, keys: &[String]) -> Result<HashMap<String, V>> {
        self.calls.lock().unwrap().push(keys.to_vec());
        if self.fail {
            return Err(Error::unavailable("batch", "connection refused"));
        }
        Ok(keys
            .iter()
            .filter_map(|k| self.values.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }
}

// ============================================================================
// Builders
// ============================================================================

fn order(id: &str, amount: i64, transfer: Option<&str>) -> PaymentOrder {
    let mut reference_numbers = vec![ReferenceNumber {
        reference_number: format!("ach_{id}"),
        reference_number_type: "ach_trace_number".to_string(),
    }];
    if let Some(t) = transfer {
        reference_numbers.push(ReferenceNumber {
            reference_number: t.to_string(),
            reference_number_type: "bnk_dev_transfer_id".to_string(),
        });
    }
    PaymentOrder {
        id: id.to_string(),
        amount,
        direction: "credit".to_string(),
        effective_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        status: Some("completed".to_string()),
        reference_numbers,
    }
}

fn transfer(id: &str, amount: i64, transaction_id: Option<&str>) -> AchTransfer {
    AchTransfer {
        id: id.to_string(),
        amount,
        transaction_id: transaction_id.map(String::from),
        status: Some("submitted".to_string()),
    }
}

fn account(id: &str) -> BankAccount {
    BankAccount {
        id: id.to_string(),
        bank_name: Some("First Bank".to_string()),
        account_type: Some("checking".to_string()),
        routing_number: Some("021000021".to_string()),
        account_number_last4: Some("6789".to_string()),
        status: Some("verified".to_string()),
    }
}

fn worker(id: &str, employer_id: Option<&str>) -> Worker {
    Worker {
        id: id.to_string(),
        employer_id: employer_id.map(String::from),
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        email: None,
        phone: None,
        date_of_birth: Some("1990-12-10".to_string()),
        employment_type: Some("W2".to_string()),
        status: Some("active".to_string()),
        start_date: None,
        address: None,
    }
}

fn values(record: &OutputRecord) -> Vec<&str> {
    record.values().iter().map(String::as_str).collect()
}

fn keys(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| (*s).to_string()).collect()
}

fn engine(policy: FailurePolicy) -> JoinEngine {
    JoinEngine::new(EngineConfig::new().with_policy(policy))
}

// ============================================================================
// Pipeline descriptors
// ============================================================================

#[test_case(&increase_transactions::PIPELINE, "increase-transactions.csv", FailurePolicy::Lenient; "increase transactions")]
#[test_case(&employer_info::PIPELINE, "employer-business-info.csv", FailurePolicy::Strict; "employer info")]
#[test_case(&employer_bank_info::PIPELINE, "employer-bank-info.csv", FailurePolicy::Lenient; "employer bank info")]
#[test_case(&worker_bank_info::PIPELINE, "worker-bank-info.csv", FailurePolicy::Lenient; "worker bank info")]
#[test_case(&worker_info::PIPELINE, "worker-personal-info.csv", FailurePolicy::Lenient; "worker info")]
fn test_pipeline_descriptor(pipeline: &Pipeline, file: &str, policy: FailurePolicy) {
    assert_eq!(pipeline.output_file, file);
    assert_eq!(pipeline.default_policy, policy);
    assert_eq!(
        pipeline.sink(std::path::Path::new("out")).path().to_path_buf(),
        std::path::Path::new("out").join(file)
    );
}

#[test]
fn test_policy_override() {
    let pipeline = &employer_info::PIPELINE;
    assert_eq!(pipeline.policy(None), FailurePolicy::Strict);
    assert_eq!(
        pipeline.policy(Some(FailurePolicy::Lenient)),
        FailurePolicy::Lenient
    );
}

#[test]
fn test_all_pipelines_have_distinct_files_and_commands() {
    let mut files: Vec<&str> = ALL.iter().map(|p| p.output_file).collect();
    let mut commands: Vec<&str> = ALL.iter().map(|p| p.command).collect();
    files.sort_unstable();
    files.dedup();
    commands.sort_unstable();
    commands.dedup();
    assert_eq!(files.len(), ALL.len());
    assert_eq!(commands.len(), ALL.len());
}

#[test]
fn test_schema_headers() {
    assert_eq!(
        increase_transactions::SCHEMA.titles().collect::<Vec<_>>(),
        vec![
            "Payroll Run ID",
            "Payment Order ID",
            "Amount",
            "Direction",
            "Effective Date",
            "Transfer ID",
            "Transfer Amount",
            "Transaction ID",
        ]
    );
    assert_eq!(employer_info::SCHEMA.len(), 13);
    assert_eq!(employer_bank_info::SCHEMA.len(), 11);
    assert_eq!(worker_bank_info::SCHEMA.len(), 10);
    assert_eq!(worker_info::SCHEMA.len(), 15);
}

// ============================================================================
// increase_transactions
// ============================================================================

#[test]
fn test_transfer_id_uses_transfer_reference_only() {
    assert_eq!(
        increase_transactions::transfer_id(&order("po_1", 100, Some("ach_transfer_9"))),
        Some("ach_transfer_9".to_string())
    );
    assert_eq!(
        increase_transactions::transfer_id(&order("po_2", 100, None)),
        None
    );
}

#[tokio::test]
async fn test_increase_run_joins_only_referenced_orders() {
    let orders = Fixed::new().with(
        "run_1",
        vec![order("po_1", 125_000, Some("t_1")), order("po_2", 99, None)],
    );
    let transfers = Transfers(HashMap::from([(
        "t_1".to_string(),
        transfer("t_1", 125_000, Some("txn_1")),
    )]));

    let mut engine = engine(FailurePolicy::Lenient);
    let rows = increase_transactions::run(&mut engine, &keys(&["run_1"]), &orders, &transfers)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(
        values(&rows[0]),
        vec!["run_1", "po_1", "125000", "credit", "2024-03-15", "t_1", "125000", "txn_1"]
    );
}

#[test]
fn test_increase_row_without_transaction_id_is_empty() {
    let row = increase_transactions::transaction_row(
        "run_1",
        &order("po_1", 10, Some("t_1")),
        transfer("t_1", 10, None),
    );
    assert_eq!(
        row.get(&increase_transactions::SCHEMA, "transaction_id"),
        Some("")
    );
    assert_eq!(row.len(), increase_transactions::SCHEMA.len());
}

// ============================================================================
// employer_info
// ============================================================================

fn employer(id: &str) -> Employer {
    Employer {
        id: id.to_string(),
        legal_name: Some("Acme Payroll LLC".to_string()),
        trade_name: None,
        ein: Some("12-3456789".to_string()),
        entity_type: Some("llc".to_string()),
        email: Some("ops@acme.test".to_string()),
        phone: None,
        status: Some("active".to_string()),
        address: Some(Address {
            line1: Some("1 Main St".to_string()),
            line2: None,
            city: Some("Springfield".to_string()),
            state: Some("IL".to_string()),
            postal_code: Some("62701".to_string()),
        }),
    }
}

#[test]
fn test_employer_row() {
    let row = employer_info::employer_row(&employer("emp_1"));
    assert_eq!(
        values(&row),
        vec![
            "emp_1",
            "Acme Payroll LLC",
            "",
            "12-3456789",
            "llc",
            "ops@acme.test",
            "",
            "active",
            "1 Main St",
            "",
            "Springfield",
            "IL",
            "62701",
        ]
    );
}

#[tokio::test]
async fn test_employer_info_strict_aborts_on_unknown_employer() {
    let employers = Fixed::new().with("emp_1", vec![employer("emp_1")]);
    let mut engine = engine(employer_info::PIPELINE.default_policy);

    let err = employer_info::run(&mut engine, &keys(&["emp_1", "emp_404"]), &employers)
        .await
        .unwrap_err();

    assert!(err.is_invalid_data());
    assert!(err.to_string().contains("not found"));
}

// ============================================================================
// employer_bank_info
// ============================================================================

fn authorizer() -> Authorizer {
    Authorizer {
        name: Some("Grace Hopper".to_string()),
        email: Some("grace@acme.test".to_string()),
        ip_address: Some("203.0.113.7".to_string()),
        authorized_at: Some("2024-01-02T03:04:05Z".to_string()),
    }
}

#[tokio::test]
async fn test_employer_bank_info_marks_missing_authorizers() {
    let accounts = Fixed::new().with("emp_1", vec![account("ba_1"), account("ba_2"), account("ba_3")]);
    let authorizers = Batch::new(vec![("ba_2", authorizer())]);
    let mut engine = engine(FailurePolicy::Lenient);

    let rows = employer_bank_info::run(&mut engine, &keys(&["emp_1"]), &accounts, &authorizers)
        .await
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(authorizers.calls(), vec![keys(&["ba_1", "ba_2", "ba_3"])]);

    let schema = &employer_bank_info::SCHEMA;
    let names: Vec<_> = rows
        .iter()
        .map(|r| r.get(schema, "authorizer_name").unwrap())
        .collect();
    assert_eq!(names, vec!["null", "Grace Hopper", "null"]);
    assert_eq!(
        values(&rows[0])[7..].to_vec(),
        vec!["null", "null", "null", "null"]
    );
    assert_eq!(rows[1].get(schema, "authorized_at"), Some("2024-01-02T03:04:05Z"));
}

#[tokio::test]
async fn test_employer_bank_info_survives_failed_authorizer_query() {
    let accounts = Fixed::new().with("emp_1", vec![account("ba_1")]);
    let authorizers = Batch::broken();
    let mut engine = engine(FailurePolicy::Lenient);

    let rows = employer_bank_info::run(&mut engine, &keys(&["emp_1"]), &accounts, &authorizers)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get(&employer_bank_info::SCHEMA, "authorizer_email"),
        Some("null")
    );
}

#[tokio::test]
async fn test_employer_bank_info_without_accounts_skips_lookup() {
    let accounts = Fixed::new().with("emp_1", Vec::new());
    let authorizers: Batch<Authorizer> = Batch::new(Vec::new());
    let mut engine = engine(FailurePolicy::Lenient);

    let rows = employer_bank_info::run(&mut engine, &keys(&["emp_1"]), &accounts, &authorizers)
        .await
        .unwrap();

    assert!(rows.is_empty());
    assert!(authorizers.calls().is_empty());
}

#[test]
fn test_bank_account_row_keeps_empty_authorizer_fields() {
    let partial = Authorizer {
        ip_address: None,
        ..authorizer()
    };
    let row = employer_bank_info::bank_account_row("emp_1", &account("ba_1"), Some(&partial));
    assert_eq!(
        row.get(&employer_bank_info::SCHEMA, "authorizer_ip_address"),
        Some("")
    );
}

// ============================================================================
// worker_bank_info
// ============================================================================

fn roster(employer_id: &str, workers: Vec<Worker>) -> EmployerWithWorkers {
    EmployerWithWorkers {
        employer: EmployerSummary {
            id: employer_id.to_string(),
            legal_name: None,
        },
        workers,
    }
}

#[tokio::test]
async fn test_worker_bank_info_rows_per_account() {
    let rosters = Fixed::new().with(
        "emp_1",
        vec![roster("emp_1", vec![worker("wk_1", None), worker("wk_2", None)])],
    );
    let worker_accounts = Batch::new(vec![("wk_1", vec![account("ba_1"), account("ba_2")])]);
    let mut engine = engine(FailurePolicy::Lenient);

    let rows = worker_bank_info::run(&mut engine, &keys(&["emp_1"]), &rosters, &worker_accounts)
        .await
        .unwrap();

    let schema = &worker_bank_info::SCHEMA;
    let summary: Vec<_> = rows
        .iter()
        .map(|r| {
            (
                r.get(schema, "employer_id").unwrap(),
                r.get(schema, "worker_id").unwrap(),
                r.get(schema, "bank_account_id").unwrap(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("emp_1", "wk_1", "ba_1"),
            ("emp_1", "wk_1", "ba_2"),
            ("emp_1", "wk_2", ""),
        ]
    );
    assert_eq!(worker_accounts.calls(), vec![keys(&["wk_1", "wk_2"])]);
}

#[tokio::test]
async fn test_worker_bank_info_lenient_skips_failed_employer() {
    let rosters = Fixed::new()
        .with("emp_1", vec![roster("emp_1", vec![worker("wk_1", None)])])
        .failing("emp_2");
    let worker_accounts: Batch<Vec<BankAccount>> = Batch::new(Vec::new());
    let mut engine = engine(FailurePolicy::Lenient);

    let rows = worker_bank_info::run(
        &mut engine,
        &keys(&["emp_2", "emp_1"]),
        &rosters,
        &worker_accounts,
    )
    .await
    .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(engine.stats().failed_keys, vec!["emp_2"]);
}

// ============================================================================
// worker_info
// ============================================================================

#[test]
fn test_worker_row_falls_back_to_employer_key() {
    let schema = &worker_info::SCHEMA;

    let own = worker_info::worker_row(&worker("wk_1", Some("emp_9")), Some("emp_1"));
    assert_eq!(own.get(schema, "employer_id"), Some("emp_9"));

    let borrowed = worker_info::worker_row(&worker("wk_1", None), Some("emp_1"));
    assert_eq!(borrowed.get(schema, "employer_id"), Some("emp_1"));

    let unknown = worker_info::worker_row(&worker("wk_1", None), None);
    assert_eq!(unknown.get(schema, "employer_id"), Some(""));
    assert_eq!(unknown.len(), schema.len());
}

#[tokio::test]
async fn test_worker_info_by_employer() {
    let employer_workers = Fixed::new()
        .with("emp_1", vec![worker("wk_1", None), worker("wk_2", None)])
        .with("emp_2", vec![worker("wk_3", Some("emp_2"))]);
    let mut engine = engine(FailurePolicy::Lenient);

    let rows = worker_info::run_for_employers(
        &mut engine,
        &keys(&["emp_1", "emp_2"]),
        &employer_workers,
    )
    .await
    .unwrap();

    let ids: Vec<_> = rows
        .iter()
        .map(|r| values(r)[..2].join("/"))
        .collect();
    assert_eq!(ids, vec!["wk_1/emp_1", "wk_2/emp_1", "wk_3/emp_2"]);
}

#[tokio::test]
async fn test_worker_info_by_worker_isolates_failures() {
    let workers = Fixed::new()
        .with("wk_1", vec![worker("wk_1", Some("emp_1"))])
        .failing("wk_2");
    let mut engine = engine(FailurePolicy::Lenient);

    let rows = worker_info::run_for_workers(&mut engine, &keys(&["wk_1", "wk_2"]), &workers)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(engine.stats().failed_keys, vec!["wk_2"]);
}

#[test]
fn test_worker_selection_keys() {
    let selection = worker_info::WorkerSelection::Workers(keys(&["wk_1"]));
    assert_eq!(selection.keys(), keys(&["wk_1"]).as_slice());
    let selection = worker_info::WorkerSelection::Employers(Vec::new());
    assert!(selection.keys().is_empty());
}
