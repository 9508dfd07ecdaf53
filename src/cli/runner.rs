//! CLI runner - executes commands
//!
//! Builds the clients a command needs from [`AppConfig`], runs the pipeline
//! and writes its file. Credentials are checked before any request goes
//! out, so a missing variable fails the command without touching the
//! network or the output directory.

use crate::cli::commands::{Cli, Commands};
use crate::config::AppConfig;
use crate::engine::{EngineConfig, JoinEngine};
use crate::error::{Error, Result};
use crate::output::OutputRecord;
use crate::pipelines::worker_info::WorkerSelection;
use crate::pipelines::{
    employer_bank_info, employer_info, increase_transactions, worker_bank_info, worker_info,
    Pipeline,
};
use crate::sources::{
    AuthorizerIndex, EmployerAccounts, EmployerRosters, EmployerWorkers, Employers, EntityClient,
    GraphDb, IncreaseClient, PaymentOrderClient, Single, WorkerAccountIndex, Workers,
};
use crate::types::{FailurePolicy, QueryKey};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
    config: AppConfig,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli, config: AppConfig) -> Self {
        Self { cli, config }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let Some(command) = &self.cli.command else {
            return Err(Error::config("no command given"));
        };

        match command {
            Commands::GetIncreaseTransaction { payroll_run_ids } => {
                self.increase_transactions(payroll_run_ids).await
            }
            Commands::GetEmployerInfo { employer_ids } => self.employer_info(employer_ids).await,
            Commands::GetEmployerBankInfo { employer_ids } => {
                self.employer_bank_info(employer_ids).await
            }
            Commands::GetWorkerBankInfo { employer_ids } => {
                self.worker_bank_info(employer_ids).await
            }
            Commands::GetWorkerInfo {
                worker_ids,
                employer_ids,
            } => {
                let selection = if worker_ids.is_empty() {
                    WorkerSelection::Employers(self.employer_ids(employer_ids))
                } else {
                    WorkerSelection::Workers(worker_ids.clone())
                };
                self.worker_info(selection).await
            }
            Commands::RunAll => self.run_all().await,
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Output directory: CLI flag, then environment, then `output`
    pub fn output_dir(&self) -> PathBuf {
        self.cli
            .output_dir
            .clone()
            .unwrap_or_else(|| self.config.output_dir.clone())
    }

    /// Policy override: CLI flag, then environment
    fn requested_policy(&self) -> Option<FailurePolicy> {
        self.cli.policy().or(self.config.failure_policy)
    }

    fn concurrency(&self) -> usize {
        self.cli
            .concurrency
            .map_or(self.config.concurrency, usize::from)
    }

    fn engine(&self, pipeline: &Pipeline) -> JoinEngine {
        JoinEngine::new(
            EngineConfig::new()
                .with_policy(pipeline.policy(self.requested_policy()))
                .with_concurrency(self.concurrency()),
        )
    }

    fn payroll_run_ids(&self, given: &[String]) -> Vec<QueryKey> {
        if given.is_empty() {
            self.config.default_payroll_run_ids.clone()
        } else {
            given.to_vec()
        }
    }

    fn employer_ids(&self, given: &[String]) -> Vec<QueryKey> {
        if given.is_empty() {
            self.config.default_employer_ids.clone()
        } else {
            given.to_vec()
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn increase_transactions(&self, given: &[String]) -> Result<()> {
        let pipeline = &increase_transactions::PIPELINE;
        let orders = PaymentOrderClient::new(&self.config.payment_orders()?)?;
        let transfers = IncreaseClient::new(&self.config.increase()?)?;

        let keys = self.payroll_run_ids(given);
        let records = if keys.is_empty() {
            warn!(command = pipeline.command, "no payroll run ids given or configured");
            Vec::new()
        } else {
            let mut engine = self.engine(pipeline);
            increase_transactions::run(&mut engine, &keys, &orders, &transfers).await?
        };
        self.emit(pipeline, &records)
    }

    async fn employer_info(&self, given: &[String]) -> Result<()> {
        let pipeline = &employer_info::PIPELINE;
        let entities = EntityClient::new(&self.config.graphql()?)?;

        let keys = self.employer_ids(given);
        let records = if keys.is_empty() {
            warn!(command = pipeline.command, "no employer ids given or configured");
            Vec::new()
        } else {
            let mut engine = self.engine(pipeline);
            employer_info::run(&mut engine, &keys, &Single(Employers(&entities))).await?
        };
        self.emit(pipeline, &records)
    }

    async fn employer_bank_info(&self, given: &[String]) -> Result<()> {
        let pipeline = &employer_bank_info::PIPELINE;
        let graph = GraphDb::new(&self.config.graph_db()?)?;

        let keys = self.employer_ids(given);
        let result = if keys.is_empty() {
            warn!(command = pipeline.command, "no employer ids given or configured");
            Ok(Vec::new())
        } else {
            let mut engine = self.engine(pipeline);
            employer_bank_info::run(
                &mut engine,
                &keys,
                &EmployerAccounts(&graph),
                &AuthorizerIndex(&graph),
            )
            .await
        };
        graph.close().await;

        self.emit(pipeline, &result?)
    }

    async fn worker_bank_info(&self, given: &[String]) -> Result<()> {
        let pipeline = &worker_bank_info::PIPELINE;
        let entities = EntityClient::new(&self.config.graphql()?)?;
        let graph = GraphDb::new(&self.config.graph_db()?)?;

        let keys = self.employer_ids(given);
        let result = if keys.is_empty() {
            warn!(command = pipeline.command, "no employer ids given or configured");
            Ok(Vec::new())
        } else {
            let mut engine = self.engine(pipeline);
            worker_bank_info::run(
                &mut engine,
                &keys,
                &Single(EmployerRosters(&entities)),
                &WorkerAccountIndex(&graph),
            )
            .await
        };
        graph.close().await;

        self.emit(pipeline, &result?)
    }

    async fn worker_info(&self, selection: WorkerSelection) -> Result<()> {
        let pipeline = &worker_info::PIPELINE;
        let entities = EntityClient::new(&self.config.graphql()?)?;

        if selection.keys().is_empty() {
            warn!(command = pipeline.command, "no worker or employer ids given or configured");
            return self.emit(pipeline, &[]);
        }

        let mut engine = self.engine(pipeline);
        let records = match &selection {
            WorkerSelection::Workers(ids) => {
                worker_info::run_for_workers(&mut engine, ids, &Single(Workers(&entities))).await?
            }
            WorkerSelection::Employers(ids) => {
                worker_info::run_for_employers(&mut engine, ids, &EmployerWorkers(&entities))
                    .await?
            }
        };
        self.emit(pipeline, &records)
    }

    /// Every pipeline with its configured defaults
    ///
    /// A failing pipeline does not stop the others; the command fails at the
    /// end if any of them did.
    async fn run_all(&self) -> Result<()> {
        let start = Instant::now();
        let outcomes = [
            (
                increase_transactions::PIPELINE.command,
                self.increase_transactions(&[]).await,
            ),
            (employer_info::PIPELINE.command, self.employer_info(&[]).await),
            (
                employer_bank_info::PIPELINE.command,
                self.employer_bank_info(&[]).await,
            ),
            (
                worker_bank_info::PIPELINE.command,
                self.worker_bank_info(&[]).await,
            ),
            (
                worker_info::PIPELINE.command,
                self.worker_info(WorkerSelection::Employers(self.employer_ids(&[])))
                    .await,
            ),
        ];

        let total = outcomes.len();
        let failed: Vec<String> = outcomes
            .into_iter()
            .filter_map(|(command, outcome)| {
                outcome
                    .inspect_err(|e| error!(command, "report failed: {e}"))
                    .err()
                    .map(|e| format!("{command} ({e})"))
            })
            .collect();

        info!(
            total,
            failed = failed.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "run-all completed"
        );

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "{} of {total} reports failed: {}",
                failed.len(),
                failed.join(", ")
            )))
        }
    }

    /// Write a pipeline's records to its file
    fn emit(&self, pipeline: &Pipeline, records: &[OutputRecord]) -> Result<()> {
        let sink = pipeline.sink(&self.output_dir());
        let rows = sink.write(&pipeline.schema, records)?;
        info!(
            command = pipeline.command,
            rows,
            path = %sink.path().display(),
            "report written"
        );
        Ok(())
    }
}

