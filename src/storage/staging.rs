//! Staging area: one JSON file per report code.
//!
//! A staged file doubles as the "already processed" marker, so a report that
//! was staged by an interrupted run is not fetched again.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error_handling::StorageError;
use crate::models::{ReportCode, StagedReport};

/// Durable per-report checkpoint.
pub trait ReportCache {
    /// Whether `code` has already been staged.
    fn exists(&self, code: &ReportCode) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// Stages `report` unless its code already is. Returns whether anything was written.
    fn stage(
        &self,
        report: &StagedReport,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;
}

/// A staged file and its decoded content.
#[derive(Debug)]
pub struct StagedFile {
    pub path: PathBuf,
    pub report: StagedReport,
}

#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, code: &ReportCode) -> PathBuf {
        self.dir.join(format!("{}.json", code))
    }

    /// Reads every staged report, ordered by file name. A missing directory is empty.
    pub async fn load_all(&self) -> Result<Vec<StagedFile>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.dir, e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut staged = Vec::with_capacity(paths.len());
        for path in paths {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| StorageError::io(&path, e))?;
            let report: StagedReport =
                serde_json::from_str(&content).map_err(|e| StorageError::json(&path, e))?;
            staged.push(StagedFile { path, report });
        }
        Ok(staged)
    }

    /// Deletes the given staged files, then the directory if it is left empty.
    pub async fn clear(&self, files: &[StagedFile]) -> Result<(), StorageError> {
        for file in files {
            match tokio::fs::remove_file(&file.path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io(&file.path, e)),
            }
        }

        // Anything else left behind keeps the directory alive
        match tokio::fs::remove_dir(&self.dir).await {
            Ok(()) => debug!("Removed staging directory {}", self.dir.display()),
            Err(e) => debug!(
                "Staging directory {} not removed: {}",
                self.dir.display(),
                e
            ),
        }
        Ok(())
    }
}

impl ReportCache for StagingArea {
    fn exists(&self, code: &ReportCode) -> impl Future<Output = Result<bool, StorageError>> + Send {
        let path = self.path_for(code);
        async move {
            tokio::fs::try_exists(&path)
                .await
                .map_err(|e| StorageError::io(&path, e))
        }
    }

    fn stage(
        &self,
        report: &StagedReport,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send {
        let path = self.path_for(&report.report_code);
        let dir = self.dir.clone();
        let content = serde_json::to_string(report).map_err(|e| StorageError::json(&path, e));
        let rows = report.data.len();
        async move {
            if tokio::fs::try_exists(&path)
                .await
                .map_err(|e| StorageError::io(&path, e))?
            {
                debug!("{} already staged, leaving it untouched", path.display());
                return Ok(false);
            }
            let content = content?;
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| StorageError::io(&dir, e))?;

            let temp = path.with_extension("json.tmp");
            tokio::fs::write(&temp, content)
                .await
                .map_err(|e| StorageError::io(&temp, e))?;
            tokio::fs::rename(&temp, &path)
                .await
                .map_err(|e| StorageError::io(&path, e))?;
            info!("Staged {} row(s) to {}", rows, path.display());
            Ok(true)
        }
    }
}
