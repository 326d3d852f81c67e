//! keystone_harvest library: Warcraft Logs report ingestion
//!
//! This library discovers recent reports of a set of uploaders, reshapes every
//! five-player keystone fight into one row per character, stages each report as
//! JSON and appends the staged rows to a date-partitioned parquet dataset.
//!
//! # Example
//!
//! ```no_run
//! use keystone_harvest::{run_harvest, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     uploader_ids: vec!["297125".to_string()],
//!     lookback_seconds: 7 * 24 * 60 * 60,
//!     ..Default::default()
//! };
//!
//! let report = run_harvest(config).await?;
//! println!("Staged {} reports, {} failed, {} rows appended",
//!          report.staged, report.failed, report.rows_appended);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod api;
pub mod assemble;
pub mod config;
pub mod discovery;
pub mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod models;
pub mod query;
mod run;
pub mod storage;
#[cfg(test)]
mod test_support;

// Re-export public API
pub use api::{GraphQlTransport, WarcraftLogsClient};
pub use config::{Config, LogFormat, LogLevel};
pub use models::{CharacterFightRecord, DatasetRow, ReportCode, StagedReport};
pub use run::{
    harvest, harvest_codes, process_code, run_harvest, HarvestReport, ReportOutcome, RunSummary,
};
