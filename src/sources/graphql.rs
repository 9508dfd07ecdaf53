//! Entity adapter over GraphQL
//!
//! Each query shape has its own operation and its own result type, so a
//! caller asking for one worker gets a [`Worker`] and a caller asking for an
//! employer's roster gets a `Vec<Worker>`. There is no mode flag.

use super::types::{Employer, EmployerSummary, EmployerWithWorkers, Worker};
use super::{Lookup, Source};
use crate::config::GraphQlConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

const SOURCE_NAME: &str = "graphql";

const WORKER_FIELDS: &str = r"
fragment WorkerFields on Worker {
  id
  employerId
  firstName
  lastName
  email
  phone
  dateOfBirth
  employmentType
  status
  startDate
  address { line1 line2 city state postalCode }
}";

const EMPLOYER_QUERY: &str = r"
query EmployerBusinessInfo($id: ID!) {
  employer(id: $id) {
    id
    legalName
    tradeName
    ein
    entityType
    email
    phone
    status
    address { line1 line2 city state postalCode }
  }
}";

const WORKER_QUERY: &str = r"
query WorkerPersonalInfo($id: ID!) {
  worker(id: $id) { ...WorkerFields }
}";

const EMPLOYER_WORKERS_QUERY: &str = r"
query EmployerWorkers($id: ID!) {
  employer(id: $id) {
    id
    workers { ...WorkerFields }
  }
}";

const EMPLOYER_ROSTER_QUERY: &str = r"
query EmployerRoster($id: ID!) {
  employer(id: $id) {
    id
    legalName
    workers { ...WorkerFields }
  }
}";

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct EmployerData {
    employer: Option<Employer>,
}

#[derive(Debug, Deserialize)]
struct WorkerData {
    worker: Option<Worker>,
}

#[derive(Debug, Deserialize)]
struct EmployerWorkersData {
    employer: Option<EmployerWorkersNode>,
}

#[derive(Debug, Deserialize)]
struct EmployerWorkersNode {
    #[serde(default)]
    workers: Vec<Worker>,
}

#[derive(Debug, Deserialize)]
struct EmployerRosterData {
    employer: Option<EmployerRosterNode>,
}

#[derive(Debug, Deserialize)]
struct EmployerRosterNode {
    #[serde(flatten)]
    employer: EmployerSummary,
    #[serde(default)]
    workers: Vec<Worker>,
}

// ============================================================================
// Client
// ============================================================================

/// Client for the GraphQL entity API
#[derive(Debug)]
pub struct EntityClient {
    http: HttpClient,
}

impl EntityClient {
    /// Create a client from validated settings
    pub fn new(config: &GraphQlConfig) -> Result<Self> {
        let http_config = HttpClientConfig::builder()
            .source_name(SOURCE_NAME)
            .base_url(&config.url)
            .build();
        Ok(Self {
            http: HttpClient::with_auth(http_config, config.auth())?,
        })
    }

    /// Run a query and unwrap the `data` member
    async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let response: GraphQlResponse<T> = self
            .http
            .post_json("", json!({ "query": query, "variables": variables }))
            .await?;

        if !response.errors.is_empty() {
            let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(Error::unavailable(SOURCE_NAME, messages.join("; ")));
        }

        response
            .data
            .ok_or_else(|| Error::invalid_data(SOURCE_NAME, "response has no data"))
    }

    /// Business information of one employer
    pub async fn employer(&self, employer_id: &str) -> Result<Employer> {
        let data: EmployerData = self
            .query(EMPLOYER_QUERY, json!({ "id": employer_id }))
            .await?;
        data.employer
            .ok_or_else(|| Error::not_found(SOURCE_NAME, "employer", employer_id))
    }

    /// Personal information of one worker
    pub async fn worker(&self, worker_id: &str) -> Result<Worker> {
        let query = format!("{WORKER_QUERY}\n{WORKER_FIELDS}");
        let data: WorkerData = self.query(&query, json!({ "id": worker_id })).await?;
        data.worker
            .ok_or_else(|| Error::not_found(SOURCE_NAME, "worker", worker_id))
    }

    /// Every worker of an employer
    pub async fn workers_for_employer(&self, employer_id: &str) -> Result<Vec<Worker>> {
        let query = format!("{EMPLOYER_WORKERS_QUERY}\n{WORKER_FIELDS}");
        let data: EmployerWorkersData = self.query(&query, json!({ "id": employer_id })).await?;
        data.employer
            .map(|node| node.workers)
            .ok_or_else(|| Error::not_found(SOURCE_NAME, "employer", employer_id))
    }

    /// An employer together with its workers
    pub async fn employer_with_workers(&self, employer_id: &str) -> Result<EmployerWithWorkers> {
        let query = format!("{EMPLOYER_ROSTER_QUERY}\n{WORKER_FIELDS}");
        let data: EmployerRosterData = self.query(&query, json!({ "id": employer_id })).await?;
        data.employer
            .map(|node| EmployerWithWorkers {
                employer: node.employer,
                workers: node.workers,
            })
            .ok_or_else(|| Error::not_found(SOURCE_NAME, "employer", employer_id))
    }
}

// ============================================================================
// Views
// ============================================================================

/// Employer business info, one per employer id
#[derive(Debug, Clone, Copy)]
pub struct Employers<'a>(pub &'a EntityClient);

#[async_trait]
impl Lookup for Employers<'_> {
    type Record = Employer;

    fn name(&self) -> &str {
        "graphql.employer"
    }

    async fn lookup(&self, key: &str) -> Result<Employer> {
        self.0.employer(key).await
    }
}

/// Worker personal info, one per worker id
#[derive(Debug, Clone, Copy)]
pub struct Workers<'a>(pub &'a EntityClient);

#[async_trait]
impl Lookup for Workers<'_> {
    type Record = Worker;

    fn name(&self) -> &str {
        "graphql.worker"
    }

    async fn lookup(&self, key: &str) -> Result<Worker> {
        self.0.worker(key).await
    }
}

/// Workers of an employer, many per employer id
#[derive(Debug, Clone, Copy)]
pub struct EmployerWorkers<'a>(pub &'a EntityClient);

#[async_trait]
impl Source for EmployerWorkers<'_> {
    type Record = Worker;

    fn name(&self) -> &str {
        "graphql.employer_workers"
    }

    async fn fetch(&self, key: &str) -> Result<Vec<Worker>> {
        self.0.workers_for_employer(key).await
    }
}

/// Employer plus roster, one per employer id
#[derive(Debug, Clone, Copy)]
pub struct EmployerRosters<'a>(pub &'a EntityClient);

#[async_trait]
impl Lookup for EmployerRosters<'_> {
    type Record = EmployerWithWorkers;

    fn name(&self) -> &str {
        "graphql.employer_roster"
    }

    async fn lookup(&self, key: &str) -> Result<EmployerWithWorkers> {
        self.0.employer_with_workers(key).await
    }
}
