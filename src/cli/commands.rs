//! CLI commands and argument parsing

use crate::types::FailurePolicy;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Payroll reconciliation reports
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "payroll-recon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory the CSV files are written to [env: RECON_OUTPUT_DIR, default: output]
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Abort on the first failing id
    #[arg(long, global = true, conflicts_with = "lenient")]
    pub strict: bool,

    /// Skip failing ids and keep going
    #[arg(long, global = true)]
    pub lenient: bool,

    /// Ids processed at once [env: RECON_CONCURRENCY, default: 1]
    #[arg(long, global = true, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Join payroll-run payment orders with their Increase ACH transfers
    GetIncreaseTransaction {
        /// Payroll run ids [default: RECON_DEFAULT_PAYROLL_RUN_IDS]
        payroll_run_ids: Vec<String>,
    },

    /// Employer business information
    GetEmployerInfo {
        /// Employer ids [default: RECON_DEFAULT_EMPLOYER_IDS]
        employer_ids: Vec<String>,
    },

    /// Employer bank accounts and who authorized them
    GetEmployerBankInfo {
        /// Employer ids [default: RECON_DEFAULT_EMPLOYER_IDS]
        employer_ids: Vec<String>,
    },

    /// Bank accounts of every worker of the given employers
    GetWorkerBankInfo {
        /// Employer ids [default: RECON_DEFAULT_EMPLOYER_IDS]
        employer_ids: Vec<String>,
    },

    /// Worker personal information, by worker or by employer
    GetWorkerInfo {
        /// Select workers by their own ids
        #[arg(long = "worker-id", num_args = 1.., conflicts_with = "employer_ids")]
        worker_ids: Vec<String>,

        /// Employer ids [default: RECON_DEFAULT_EMPLOYER_IDS]
        employer_ids: Vec<String>,
    },

    /// Run every report with the configured default ids
    RunAll,
}

/// What the process was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Run a command
    Run(Cli),
    /// No or unknown command: print this usage text and exit cleanly
    Usage(String),
}

impl Cli {
    /// Parse arguments, turning a missing or unknown command into a usage request
    ///
    /// Other parse failures (bad flags, `--help`, `--version`) are returned
    /// for clap to report.
    pub fn parse_invocation<I, T>(args: I) -> Result<Invocation, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) if cli.command.is_none() => Ok(Invocation::Usage(Self::usage())),
            Ok(cli) => Ok(Invocation::Run(cli)),
            Err(e) if e.kind() == ErrorKind::InvalidSubcommand => {
                Ok(Invocation::Usage(Self::usage()))
            }
            Err(e) => Err(e),
        }
    }

    /// Full help text
    pub fn usage() -> String {
        Self::command().render_help().to_string()
    }

    /// Failure policy requested on the command line
    pub fn policy(&self) -> Option<FailurePolicy> {
        if self.strict {
            Some(FailurePolicy::Strict)
        } else if self.lenient {
            Some(FailurePolicy::Lenient)
        } else {
            None
        }
    }
}
