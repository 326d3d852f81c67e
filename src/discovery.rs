//! Report discovery.
//!
//! Lists the most recent reports of each configured uploader, keeps those
//! started inside the lookback window and removes codes already in the ledger.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::api::GraphQlTransport;
use crate::error_handling::FetchError;
use crate::fetch::fetch_uploader_reports;
use crate::models::{ReportCode, ReportSummary};

/// Whether a report started strictly after `now - lookback_seconds`.
pub fn within_lookback(report: &ReportSummary, lookback_seconds: i64, now: DateTime<Utc>) -> bool {
    let cutoff = (now.timestamp() - lookback_seconds) as f64;
    report.start_time / 1000.0 > cutoff
}

/// Union of the recent report codes of every uploader.
///
/// A failing uploader listing fails the whole discovery.
pub async fn discover_codes<T: GraphQlTransport>(
    transport: &T,
    uploader_ids: &[String],
    page_size: u32,
    lookback_seconds: i64,
    now: DateTime<Utc>,
) -> Result<BTreeSet<ReportCode>, FetchError> {
    let mut codes = BTreeSet::new();
    for uploader in uploader_ids {
        let reports = fetch_uploader_reports(transport, uploader, page_size).await?;
        let listed = reports.len();
        let recent: Vec<ReportCode> = reports
            .into_iter()
            .filter(|report| within_lookback(report, lookback_seconds, now))
            .map(|report| report.code)
            .collect();
        debug!(
            "Uploader {}: {} of {} listed reports inside the lookback window",
            uploader,
            recent.len(),
            listed
        );
        codes.extend(recent);
    }
    info!(
        "Discovered {} recent report(s) from {} uploader(s)",
        codes.len(),
        uploader_ids.len()
    );
    Ok(codes)
}

/// Codes of `candidates` that are not in `ledger`.
pub fn dedup(
    candidates: &BTreeSet<ReportCode>,
    ledger: &BTreeSet<ReportCode>,
) -> BTreeSet<ReportCode> {
    candidates.difference(ledger).cloned().collect()
}
