//! CLI module
//!
//! Command-line interface for the reconciliation reports.
//!
//! # Commands
//!
//! - `get-increase-transaction` - Payment orders joined with ACH transfers
//! - `get-employer-info` - Employer business information
//! - `get-employer-bank-info` - Employer bank accounts and authorizers
//! - `get-worker-bank-info` - Worker bank accounts by employer
//! - `get-worker-info` - Worker personal information
//! - `run-all` - Every report with the configured defaults

mod commands;
mod runner;

pub use commands::{Cli, Commands, Invocation};
pub use runner::Runner;
