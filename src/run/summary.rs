//! Per-report outcomes and their aggregation.

use log::warn;

use crate::assemble::FightWarnings;
use crate::error_handling::{categorize_error, ProcessingStats, WarningType};
use crate::models::ReportCode;
use crate::storage::ErrorLogEntry;

/// What happened to one report code of the work list.
#[derive(Debug)]
pub enum ReportOutcome {
    /// Assembled and written to staging
    Staged {
        code: ReportCode,
        rows: usize,
        fights: usize,
        warnings: FightWarnings,
    },
    /// A staging file already existed; nothing was fetched
    AlreadyStaged { code: ReportCode },
    Failed {
        code: ReportCode,
        error: anyhow::Error,
    },
}

impl ReportOutcome {
    pub fn code(&self) -> &ReportCode {
        match self {
            ReportOutcome::Staged { code, .. }
            | ReportOutcome::AlreadyStaged { code }
            | ReportOutcome::Failed { code, .. } => code,
        }
    }

    /// Whether the code ends up in the ledger.
    pub fn is_processed(&self) -> bool {
        !matches!(self, ReportOutcome::Failed { .. })
    }
}

/// Outcomes of one run, in work-list order, plus their statistics.
#[derive(Debug, Default)]
pub struct RunSummary {
    outcomes: Vec<ReportOutcome>,
    stats: ProcessingStats,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: ReportOutcome) {
        match &outcome {
            ReportOutcome::Staged { warnings, .. } => {
                self.stats
                    .add_warnings(WarningType::IncompleteActor, warnings.incomplete_actors);
                self.stats
                    .add_warnings(WarningType::UnmatchedDeath, warnings.unmatched_deaths);
                self.stats.add_warnings(
                    WarningType::MissingDungeonName,
                    warnings.missing_dungeon_names,
                );
            }
            ReportOutcome::AlreadyStaged { .. } => {}
            ReportOutcome::Failed { code, error } => {
                let kind = categorize_error(error);
                warn!("Report {} failed ({}): {:#}", code, kind, error);
                self.stats.increment_failure(kind);
            }
        }
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[ReportOutcome] {
        &self.outcomes
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Codes that were staged in this or an earlier run.
    pub fn processed_codes(&self) -> impl Iterator<Item = &ReportCode> {
        self.outcomes
            .iter()
            .filter(|o| o.is_processed())
            .map(ReportOutcome::code)
    }

    pub fn error_log_entries(&self) -> Vec<ErrorLogEntry<'_>> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ReportOutcome::Failed { code, error } => Some(ErrorLogEntry { code, error }),
                _ => None,
            })
            .collect()
    }

    pub fn staged(&self) -> usize {
        self.count(|o| matches!(o, ReportOutcome::Staged { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ReportOutcome::AlreadyStaged { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ReportOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&ReportOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}
