//! Processed-code ledger.
//!
//! A JSON array of report codes. Reads tolerate a missing or corrupt file;
//! writes replace the whole file through a temporary sibling and a rename.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error_handling::StorageError;
use crate::models::ReportCode;

/// Loads the ledger. Absent, unreadable or unparseable files yield an empty set.
pub async fn load(path: &Path) -> Result<BTreeSet<ReportCode>, StorageError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No ledger at {}, starting empty", path.display());
            return Ok(BTreeSet::new());
        }
        Err(e) => {
            warn!(
                "Ledger {} could not be read ({}), treating it as empty",
                path.display(),
                e
            );
            return Ok(BTreeSet::new());
        }
    };

    match serde_json::from_str::<BTreeSet<ReportCode>>(&content) {
        Ok(codes) => {
            debug!("Loaded {} processed code(s) from {}", codes.len(), path.display());
            Ok(codes)
        }
        Err(e) => {
            warn!(
                "Ledger {} is unreadable ({}), treating it as empty",
                path.display(),
                e
            );
            Ok(BTreeSet::new())
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Overwrites the ledger with the full set.
pub async fn save(path: &Path, codes: &BTreeSet<ReportCode>) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))?;
    }
    let content = serde_json::to_string_pretty(codes).map_err(|e| StorageError::json(path, e))?;

    let temp = temp_path(path);
    tokio::fs::write(&temp, content)
        .await
        .map_err(|e| StorageError::io(&temp, e))?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| StorageError::io(path, e))?;
    debug!("Saved {} processed code(s) to {}", codes.len(), path.display());
    Ok(())
}
