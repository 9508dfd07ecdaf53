//! Graph database adapter
//!
//! Talks Cypher to the graph database over its HTTP transaction API. A
//! [`GraphDb`] handle owns one explicit transaction, which is opened on the
//! first query and rolled back by [`GraphDb::close`]. All statements are
//! reads, so rolling back is the normal way to release the session.
//!
//! The transaction endpoint takes one request at a time, so statements from
//! concurrently processed keys queue on the handle.
//!
//! Commands create the handle, pass it by reference to whatever needs it and
//! close it on every exit path.

use super::types::{Authorizer, BankAccount};
use super::{BatchSource, Source};
use crate::config::GraphDbConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SOURCE_NAME: &str = "graph-db";

const EMPLOYER_ACCOUNTS_QUERY: &str = "\
MATCH (e:Employer {id: $employer_id})-[:HAS_BANK_ACCOUNT]->(b:BankAccount) \
RETURN b.id AS id, b.bank_name AS bank_name, b.account_type AS account_type, \
b.routing_number AS routing_number, b.account_number_last4 AS account_number_last4, \
b.status AS status \
ORDER BY b.id";

const WORKER_ACCOUNTS_QUERY: &str = "\
MATCH (w:Worker)-[:HAS_BANK_ACCOUNT]->(b:BankAccount) \
WHERE w.id IN $worker_ids \
RETURN w.id AS worker_id, b.id AS id, b.bank_name AS bank_name, \
b.account_type AS account_type, b.routing_number AS routing_number, \
b.account_number_last4 AS account_number_last4, b.status AS status \
ORDER BY w.id, b.id";

const AUTHORIZERS_QUERY: &str = "\
MATCH (a:Authorizer)-[r:AUTHORIZED]->(b:BankAccount) \
WHERE b.id IN $account_ids \
RETURN b.id AS account_id, a.name AS name, a.email AS email, \
r.ip_address AS ip_address, toString(r.authorized_at) AS authorized_at \
ORDER BY b.id, r.authorized_at";

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WorkerAccountRow {
    worker_id: String,
    #[serde(flatten)]
    account: BankAccount,
}

#[derive(Debug, Deserialize)]
struct AuthorizerRow {
    account_id: String,
    #[serde(flatten)]
    authorizer: Authorizer,
}

fn check_errors(errors: &[TxError]) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<String> = errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect();
    Err(Error::unavailable(SOURCE_NAME, messages.join("; ")))
}

/// Turn column-ordered rows into typed records
fn decode_rows<T: DeserializeOwned>(result: StatementResult) -> Result<Vec<T>> {
    result
        .data
        .into_iter()
        .map(|data| {
            let object: Map<String, Value> = result
                .columns
                .iter()
                .cloned()
                .zip(data.row)
                .collect();
            serde_json::from_value(Value::Object(object))
                .map_err(|e| Error::invalid_data(SOURCE_NAME, format!("unexpected row shape: {e}")))
        })
        .collect()
}

// ============================================================================
// Handle
// ============================================================================

/// Lazily opened graph database session
#[derive(Debug)]
pub struct GraphDb {
    http: HttpClient,
    database: String,
    /// URL of the open transaction. Held for the whole statement, so
    /// statements on one session never overlap.
    transaction: Mutex<Option<String>>,
}

impl GraphDb {
    /// Create a handle; nothing is sent until the first query
    pub fn new(config: &GraphDbConfig) -> Result<Self> {
        let http_config = HttpClientConfig::builder()
            .source_name(SOURCE_NAME)
            .base_url(&config.url)
            .build();
        Ok(Self {
            http: HttpClient::with_auth(http_config, config.auth())?,
            database: config.database.clone(),
            transaction: Mutex::new(None),
        })
    }

    /// Whether a transaction is currently open
    pub async fn is_open(&self) -> bool {
        self.transaction.lock().await.is_some()
    }

    async fn open(&self) -> Result<String> {
        let path = format!("/db/{}/tx", self.database);
        let response = self
            .http
            .send_json::<TxResponse>(
                Method::POST,
                &path,
                RequestConfig::new().json(json!({ "statements": [] })),
            )
            .await?;
        check_errors(&response.body.errors)?;

        let location = response.header("location").ok_or_else(|| {
            Error::invalid_data(SOURCE_NAME, "transaction response has no Location header")
        })?;
        info!(database = %self.database, "opened graph database session");
        debug!(transaction = location, "graph database transaction");
        Ok(location.to_string())
    }

    async fn rollback(&self, tx: &str) -> Result<()> {
        self.http
            .request(Method::DELETE, tx, RequestConfig::new())
            .await
            .map(|_| ())
    }

    async fn execute(&self, tx: &str, statement: &str, parameters: Value) -> Result<StatementResult> {
        let body = json!({
            "statements": [{
                "statement": statement,
                "parameters": parameters,
                "resultDataContents": ["row"],
            }]
        });

        let response = self
            .http
            .send_json::<TxResponse>(Method::POST, tx, RequestConfig::new().json(body))
            .await?;
        check_errors(&response.body.errors)?;

        response
            .body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::invalid_data(SOURCE_NAME, "statement returned no result"))
    }

    /// Run one statement inside the session transaction
    ///
    /// A failed statement leaves the transaction unusable on the server, so
    /// it is rolled back and forgotten; the next statement opens a new one.
    async fn run<T: DeserializeOwned>(&self, statement: &str, parameters: Value) -> Result<Vec<T>> {
        let mut transaction = self.transaction.lock().await;
        let tx = match transaction.as_ref() {
            Some(tx) => tx.clone(),
            None => {
                let tx = self.open().await?;
                *transaction = Some(tx.clone());
                tx
            }
        };

        match self.execute(&tx, statement, parameters).await {
            Ok(result) => decode_rows(result),
            Err(e) => {
                *transaction = None;
                if let Err(rollback) = self.rollback(&tx).await {
                    debug!(transaction = %tx, "rollback after failed statement: {rollback}");
                }
                warn!(database = %self.database, "discarded graph database transaction: {e}");
                Err(e)
            }
        }
    }

    /// Bank accounts linked to an employer
    pub async fn employer_bank_accounts(&self, employer_id: &str) -> Result<Vec<BankAccount>> {
        self.run(
            EMPLOYER_ACCOUNTS_QUERY,
            json!({ "employer_id": employer_id }),
        )
        .await
    }

    /// Bank accounts of many workers, keyed by worker id
    pub async fn worker_bank_accounts(
        &self,
        worker_ids: &[String],
    ) -> Result<HashMap<String, Vec<BankAccount>>> {
        let rows: Vec<WorkerAccountRow> = self
            .run(WORKER_ACCOUNTS_QUERY, json!({ "worker_ids": worker_ids }))
            .await?;

        let mut accounts: HashMap<String, Vec<BankAccount>> = HashMap::new();
        for row in rows {
            accounts.entry(row.worker_id).or_default().push(row.account);
        }
        Ok(accounts)
    }

    /// Authorizers of many bank accounts, keyed by account id
    ///
    /// When an account has several authorizations the earliest one wins.
    pub async fn authorizers(&self, account_ids: &[String]) -> Result<HashMap<String, Authorizer>> {
        let rows: Vec<AuthorizerRow> = self
            .run(AUTHORIZERS_QUERY, json!({ "account_ids": account_ids }))
            .await?;

        let mut authorizers = HashMap::new();
        for row in rows {
            authorizers.entry(row.account_id).or_insert(row.authorizer);
        }
        Ok(authorizers)
    }

    /// Release the session
    ///
    /// Never fails: a problem while rolling back is logged so it cannot mask
    /// the outcome of the command that used the session.
    pub async fn close(self) {
        let Some(tx) = self.transaction.lock().await.take() else {
            debug!("graph database session has no open transaction");
            return;
        };

        match self.rollback(&tx).await {
            Ok(_) => info!(database = %self.database, "closed graph database session"),
            Err(e) => warn!(database = %self.database, "failed to close graph database session: {e}"),
        }
    }
}

// ============================================================================
// Views
// ============================================================================

/// Bank accounts, many per employer id
#[derive(Debug, Clone, Copy)]
pub struct EmployerAccounts<'a>(pub &'a GraphDb);

#[async_trait]
impl Source for EmployerAccounts<'_> {
    type Record = BankAccount;

    fn name(&self) -> &str {
        "graph-db.employer_accounts"
    }

    async fn fetch(&self, key: &str) -> Result<Vec<BankAccount>> {
        self.0.employer_bank_accounts(key).await
    }
}

/// Bulk authorizer lookup by account id
#[derive(Debug, Clone, Copy)]
pub struct AuthorizerIndex<'a>(pub &'a GraphDb);

#[async_trait]
impl BatchSource for AuthorizerIndex<'_> {
    type Value = Authorizer;

    fn name(&self) -> &str {
        "graph-db.authorizers"
    }

    async fn fetch_batch(&self, keys: &[String]) -> Result<HashMap<String, Authorizer>> {
        self.0.authorizers(keys).await
    }
}

/// Bulk bank-account lookup by worker id
#[derive(Debug, Clone, Copy)]
pub struct WorkerAccountIndex<'a>(pub &'a GraphDb);

#[async_trait]
impl BatchSource for WorkerAccountIndex<'_> {
    type Value = Vec<BankAccount>;

    fn name(&self) -> &str {
        "graph-db.worker_accounts"
    }

    async fn fetch_batch(&self, keys: &[String]) -> Result<HashMap<String, Vec<BankAccount>>> {
        self.0.worker_bank_accounts(keys).await
    }
}
