//! Per-report processing.
//!
//! Each code of the work list is handled on its own: a failure is captured as
//! a `ReportOutcome::Failed` and never stops the loop.

use anyhow::{Context, Result};
use log::info;

use crate::api::GraphQlTransport;
use crate::assemble::assemble_report;
use crate::models::ReportCode;
use crate::storage::ReportCache;

use super::summary::{ReportOutcome, RunSummary};

async fn assemble_and_stage<T, C>(
    transport: &T,
    cache: &C,
    code: &ReportCode,
) -> Result<ReportOutcome>
where
    T: GraphQlTransport,
    C: ReportCache,
{
    let assembly = assemble_report(transport, code).await?;
    let rows = assembly.records.len();
    let fights = assembly.fights_assembled;
    let warnings = assembly.warnings;

    let written = cache
        .stage(&assembly.into_staged())
        .await
        .context("Failed to stage report")?;
    if !written {
        return Ok(ReportOutcome::AlreadyStaged { code: code.clone() });
    }
    Ok(ReportOutcome::Staged {
        code: code.clone(),
        rows,
        fights,
        warnings,
    })
}

/// Processes one code: skipped when already staged, otherwise assembled and staged.
pub async fn process_code<T, C>(transport: &T, cache: &C, code: &ReportCode) -> ReportOutcome
where
    T: GraphQlTransport,
    C: ReportCache,
{
    match cache.exists(code).await {
        Ok(true) => {
            info!("{} is already staged, skipping API calls", code);
            return ReportOutcome::AlreadyStaged { code: code.clone() };
        }
        Ok(false) => {}
        Err(e) => {
            return ReportOutcome::Failed {
                code: code.clone(),
                error: anyhow::Error::new(e).context("Failed to check staging"),
            }
        }
    }

    match assemble_and_stage(transport, cache, code).await {
        Ok(outcome) => outcome,
        Err(error) => ReportOutcome::Failed {
            code: code.clone(),
            error,
        },
    }
}

/// Runs every code of the work list sequentially, in order.
pub async fn harvest_codes<'a, T, C>(
    transport: &T,
    cache: &C,
    codes: impl IntoIterator<Item = &'a ReportCode>,
) -> RunSummary
where
    T: GraphQlTransport,
    C: ReportCache,
{
    let codes: Vec<&ReportCode> = codes.into_iter().collect();
    let total = codes.len();
    let mut summary = RunSummary::new();
    for (index, code) in codes.into_iter().enumerate() {
        summary.record(process_code(transport, cache, code).await);
        info!("Done with report {} of {}", index + 1, total);
    }
    summary
}
