// storage/mod.rs
// Durable state: ledger, staging area, parquet dataset and error log

pub mod dataset;
pub mod error_log;
pub mod ledger;
pub mod staging;

// Re-export commonly used items
pub use dataset::{compact, read_dataset, CompactionReport};
pub use error_log::ErrorLogEntry;
pub use staging::{ReportCache, StagedFile, StagingArea};
