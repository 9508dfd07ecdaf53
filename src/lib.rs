// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # payroll-recon
//!
//! Reconciles payroll payments across the systems that move and describe
//! them, and writes the results to CSV for manual review.
//!
//! ## Reports
//!
//! - **Increase transactions**: payment orders of a payroll run joined with
//!   the Increase ACH transfers they reference
//! - **Employer business info**: employer records from the entity API
//! - **Employer bank info**: employer bank accounts with their authorizers
//! - **Worker bank info**: bank accounts of every worker of an employer
//! - **Worker personal info**: worker records, by worker or by employer
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use payroll_recon::engine::{EngineConfig, JoinEngine};
//! use payroll_recon::pipelines::increase_transactions;
//! use payroll_recon::sources::{IncreaseClient, PaymentOrderClient};
//! use payroll_recon::{config::AppConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let orders = PaymentOrderClient::new(&config.payment_orders()?)?;
//!     let transfers = IncreaseClient::new(&config.increase()?)?;
//!
//!     let mut engine = JoinEngine::new(EngineConfig::default());
//!     let runs = vec!["pr_2024_03_15".to_string()];
//!     let rows = increase_transactions::run(&mut engine, &runs, &orders, &transfers).await?;
//!
//!     increase_transactions::PIPELINE
//!         .sink(&config.output_dir)
//!         .write(&increase_transactions::SCHEMA, &rows)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            CLI                                  │
//! │  get-increase-transaction  get-employer-info  ...  run-all      │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────────┬─────────────────────┐
//! │  Pipelines   │       Join Engine         │   Batch Lookup      │
//! ├──────────────┴───────────────────────────┴─────────────────────┤
//! │                        Source Adapters                          │
//! │  payment orders │ Increase │ GraphQL entities │ graph database  │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   Auth   │   HTTP   │   Config   │   CSV Output                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Environment configuration
pub mod config;

/// Authentication for the external APIs
pub mod auth;

/// HTTP client
pub mod http;

/// Source adapters for the external systems
pub mod sources;

/// Bulk lookup cache
pub mod lookup;

/// Join engine
pub mod engine;

/// CSV output
pub mod output;

/// Report pipelines
pub mod pipelines;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
