//! Processing statistics tracking.
//!
//! Counts report failures by kind and data-quality warnings for the end-of-run
//! summary. The pipeline is sequential, so plain counters are enough.

use std::collections::HashMap;

use strum::IntoEnumIterator;

use super::types::{FailureKind, WarningType};

/// Per-run failure and warning counters. All kinds start at zero.
#[derive(Debug, Clone)]
pub struct ProcessingStats {
    failures: HashMap<FailureKind, usize>,
    warnings: HashMap<WarningType, usize>,
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self {
            failures: FailureKind::iter().map(|kind| (kind, 0)).collect(),
            warnings: WarningType::iter().map(|kind| (kind, 0)).collect(),
        }
    }

    pub fn increment_failure(&mut self, kind: FailureKind) {
        *self.failures.entry(kind).or_insert(0) += 1;
    }

    pub fn add_warnings(&mut self, warning: WarningType, count: usize) {
        *self.warnings.entry(warning).or_insert(0) += count;
    }

    pub fn get_failure_count(&self, kind: FailureKind) -> usize {
        self.failures.get(&kind).copied().unwrap_or(0)
    }

    pub fn get_warning_count(&self, warning: WarningType) -> usize {
        self.warnings.get(&warning).copied().unwrap_or(0)
    }

    pub fn total_failures(&self) -> usize {
        self.failures.values().sum()
    }

    pub fn total_warnings(&self) -> usize {
        self.warnings.values().sum()
    }

    /// Logs every non-zero counter, failures first.
    pub fn log_summary(&self) {
        for kind in FailureKind::iter() {
            let count = self.get_failure_count(kind);
            if count > 0 {
                log::warn!("{}: {}", kind.as_str(), count);
            }
        }
        for warning in WarningType::iter() {
            let count = self.get_warning_count(warning);
            if count > 0 {
                log::info!("{}: {}", warning.as_str(), count);
            }
        }
    }
}
