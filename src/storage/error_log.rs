//! Append-only error log for failed reports.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::io::AsyncWriteExt;

use crate::error_handling::StorageError;
use crate::models::ReportCode;

const SEPARATOR: &str = "--------------------------------------------------";

pub struct ErrorLogEntry<'a> {
    pub code: &'a ReportCode,
    pub error: &'a anyhow::Error,
}

fn format_entry(entry: &ErrorLogEntry<'_>, at: DateTime<Utc>) -> String {
    format!(
        "--- Timestamp: {} ---\nError processing code '{}': {}\n{:?}\n{}\n\n",
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
        entry.code,
        entry.error,
        entry.error,
        SEPARATOR
    )
}

/// Appends one block per entry (timestamp, code, full error chain).
/// Nothing is written when `entries` is empty.
pub async fn append(
    path: &Path,
    entries: &[ErrorLogEntry<'_>],
    at: DateTime<Utc>,
) -> Result<(), StorageError> {
    if entries.is_empty() {
        return Ok(());
    }
    let text: String = entries.iter().map(|entry| format_entry(entry, at)).collect();

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| StorageError::io(path, e))?;
    file.write_all(text.as_bytes())
        .await
        .map_err(|e| StorageError::io(path, e))?;
    file.flush().await.map_err(|e| StorageError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_entries_are_appended_with_cause_chain() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error_log.txt");
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let code = ReportCode::new("ABC123");
        let error = Err::<(), _>(anyhow::anyhow!("HTTP 500"))
            .context("Failed to fetch roster")
            .unwrap_err();

        append(&path, &[ErrorLogEntry { code: &code, error: &error }], at)
            .await
            .unwrap();
        append(&path, &[ErrorLogEntry { code: &code, error: &error }], at)
            .await
            .unwrap();

        let log = std::fs::read_to_string(&path).unwrap();
        assert_eq!(log.matches("--- Timestamp: 2023-11-14T22:13:20Z ---").count(), 2);
        assert!(log.contains("Error processing code 'ABC123': Failed to fetch roster"));
        assert!(log.contains("Failed to fetch roster"));
        assert!(log.contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_no_entries_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error_log.txt");
        append(&path, &[], Utc::now()).await.unwrap();
        assert!(!path.exists());
    }
}
