// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! payroll-recon CLI
//!
//! Command-line interface for the payroll reconciliation reports

use payroll_recon::cli::{Cli, Invocation, Runner};
use payroll_recon::config::AppConfig;
use payroll_recon::types::Verbosity;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Log to stderr; `RUST_LOG` wins over `RECON_LOG_LEVEL`
fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.as_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = match Cli::parse_invocation(std::env::args_os()) {
        Ok(Invocation::Run(cli)) => cli,
        Ok(Invocation::Usage(usage)) => {
            println!("{usage}");
            return;
        }
        Err(e) => e.exit(),
    };

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    init_logging(config.verbosity);
    if let Some(path) = &config.env_file {
        debug!("loaded environment from {}", path.display());
    }

    let runner = Runner::new(cli, config);
    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
