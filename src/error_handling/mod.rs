//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for fetch, storage and initialization
//! - Failure categorization from error chains
//! - Processing statistics (failures by kind, data-quality warnings)

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_error, categorize_reqwest_error};
pub use stats::ProcessingStats;
pub use types::{FailureKind, FetchError, InitializationError, StorageError, WarningType};
