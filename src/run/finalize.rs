//! Run finalization.
//!
//! After the per-report loop: failures go to the error log (best effort), processed codes
//! are folded into the ledger and saved, then staging is compacted into the
//! dataset. The ledger is saved before compaction; a compaction failure ends
//! the run with the staged files still in place.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::config::Config;
use crate::models::ReportCode;
use crate::storage::{self, error_log, ledger, CompactionReport, StagingArea};

use super::summary::RunSummary;

pub async fn finalize_run(
    config: &Config,
    staging: &StagingArea,
    mut processed: BTreeSet<ReportCode>,
    summary: &RunSummary,
    now: DateTime<Utc>,
) -> Result<CompactionReport> {
    let failures = summary.error_log_entries();
    if !failures.is_empty() {
        match error_log::append(&config.error_log_path, &failures, now).await {
            Ok(()) => info!(
                "{} failed report(s) logged to {}",
                failures.len(),
                config.error_log_path.display()
            ),
            Err(e) => warn!("Failed to write error log: {}", e),
        }
    }

    processed.extend(summary.processed_codes().cloned());
    ledger::save(&config.ledger_path, &processed)
        .await
        .context("Failed to save ledger")?;

    let compaction = storage::compact(staging, &config.dataset_dir, now.date_naive())
        .await
        .context("Failed to compact staged reports into the dataset")?;

    summary.stats().log_summary();
    Ok(compaction)
}
