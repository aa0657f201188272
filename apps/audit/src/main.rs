//! PRIMED audit command line runner.

#![forbid(unsafe_code)]

mod audit_config;
mod cli;
mod runner;

use std::process::ExitCode;

use clap::Parser;
use primed_core::AppResult;
use tracing::error;

use crate::audit_config::{AuditConfig, init_tracing};
use crate::cli::Cli;
use crate::runner::AuditRunner;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(app_error) => {
            error!(error = %app_error, "audit failed");
            eprintln!("{app_error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<bool> {
    let config = AuditConfig::load()?;
    let runner = AuditRunner::from_config(&config, cli.data.as_deref()).await?;

    let mut all_ok = true;
    for kind in cli.command.kinds() {
        let (summary, ok) = runner.run(kind, cli.email.as_deref()).await?;
        print!("{summary}");
        all_ok &= ok;
    }

    Ok(all_ok)
}
