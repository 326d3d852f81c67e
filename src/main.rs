//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `keystone_harvest` library that handles:
//! - Environment variable loading (.env file)
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use keystone_harvest::config::Opt;
use keystone_harvest::initialization::init_logger_with;
use keystone_harvest::{run_harvest, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // WARCRAFTLOGS_TOKEN, CLIENT_ID and CLIENT_SECRET may live in .env
    let _ = dotenvy::dotenv();

    let config = Config::from(Opt::parse());

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    match run_harvest(config).await {
        Ok(report) => {
            println!(
                "Processed {} report{} ({} staged, {} already staged, {} failed), \
                 appended {} row{} in {:.1}s",
                report.work_list,
                if report.work_list == 1 { "" } else { "s" },
                report.staged,
                report.skipped,
                report.failed,
                report.rows_appended,
                if report.rows_appended == 1 { "" } else { "s" },
                report.elapsed_seconds
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("keystone_harvest error: {:#}", e);
            process::exit(1);
        }
    }
}
