//! cattle-exec binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cattle_exec::cli::Cli;
use cattle_exec::config::ConnectionConfig;
use cattle_exec::output::{OutputFormat, RunSummary};
use cattle_exec::{ExecError, Orchestrator};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the relayed command output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every target succeeded.
async fn run(cli: &Cli) -> Result<bool, ExecError> {
    let invocation = cli.invocation()?;
    let config = ConnectionConfig::from_env()?;
    let orchestrator = Orchestrator::new(invocation, config)?;

    let report = {
        let mut stdout = io::stdout().lock();
        orchestrator.run(&mut stdout).await?
    };

    if !report.targets.is_empty() {
        let format = OutputFormat::new(cli.format);
        format.write(&mut io::stderr().lock(), &RunSummary::from(&report))?;
    }

    Ok(report.is_success())
}
