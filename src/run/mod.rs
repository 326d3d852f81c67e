//! Harvest orchestration.
//!
//! One run: resolve a token, load the ledger, discover and deduplicate codes,
//! process each code sequentially into staging, then finalize (error log,
//! ledger, compaction).

mod finalize;
mod summary;
mod task;

use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;

use crate::api::{GraphQlTransport, WarcraftLogsClient};
use crate::config::Config;
use crate::discovery::{dedup, discover_codes};
use crate::initialization::{init_client, resolve_token};
use crate::storage::{ledger, StagingArea};

pub use summary::{ReportOutcome, RunSummary};
pub use task::{harvest_codes, process_code};

/// Results of a harvest run.
#[derive(Debug)]
pub struct HarvestReport {
    /// Recent report codes found for the configured uploaders
    pub discovered: usize,
    /// Codes left after removing those already in the ledger
    pub work_list: usize,
    /// Reports assembled and staged by this run
    pub staged: usize,
    /// Reports found already staged by an earlier run
    pub skipped: usize,
    /// Reports that failed (see the error log)
    pub failed: usize,
    /// Rows appended to the dataset by compaction
    pub rows_appended: usize,
    /// Elapsed time in seconds
    pub elapsed_seconds: f64,
    /// Per-code outcomes and statistics
    pub summary: RunSummary,
}

/// Runs one harvest against the live API.
///
/// # Errors
///
/// Returns an error when initialization, discovery, ledger/error-log writes or
/// compaction fail. Failures of individual reports are not errors; they are
/// counted in the report and written to the error log.
///
/// # Example
///
/// ```no_run
/// use keystone_harvest::{run_harvest, Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config {
///     access_token: Some("token".to_string()),
///     ..Default::default()
/// };
/// let report = run_harvest(config).await?;
/// println!("Staged {} reports", report.staged);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config) -> Result<HarvestReport> {
    let http = init_client(&config).context("Failed to initialize HTTP client")?;
    let token = resolve_token(&config, &http)
        .await
        .context("Failed to resolve API token")?;
    let client = WarcraftLogsClient::new(http, config.api_url.clone(), token);
    info!("Authorization complete");

    harvest(&config, &client, Utc::now()).await
}

/// Runs one harvest through `transport`, treating `now` as the current time
/// (lookback window and partition date).
pub async fn harvest<T: GraphQlTransport>(
    config: &Config,
    transport: &T,
    now: DateTime<Utc>,
) -> Result<HarvestReport> {
    let start = Instant::now();

    let processed = ledger::load(&config.ledger_path)
        .await
        .context("Failed to load ledger")?;
    let candidates = discover_codes(
        transport,
        &config.uploader_ids,
        config.report_page_size,
        config.lookback_seconds,
        now,
    )
    .await
    .context("Failed to discover reports")?;
    let work = dedup(&candidates, &processed);
    info!(
        "{} new report(s) to process ({} discovered, {} already in the ledger)",
        work.len(),
        candidates.len(),
        candidates.len() - work.len()
    );

    let staging = StagingArea::new(&config.staging_dir);
    let summary = harvest_codes(transport, &staging, &work).await;
    let compaction = finalize::finalize_run(config, &staging, processed, &summary, now).await?;

    Ok(HarvestReport {
        discovered: candidates.len(),
        work_list: work.len(),
        staged: summary.staged(),
        skipped: summary.skipped(),
        failed: summary.failed(),
        rows_appended: compaction.rows,
        elapsed_seconds: start.elapsed().as_secs_f64(),
        summary,
    })
}
