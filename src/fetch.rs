//! Facet fetching.
//!
//! Each facet is one request through a `GraphQlTransport` followed by the
//! extraction of a fixed nested path of the envelope into a list of typed records.
//! A path that is present but holds zero entries yields an empty list; a path
//! that is absent (or null) is a `FetchError::MissingPath`.

use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::api::GraphQlTransport;
use crate::error_handling::FetchError;
use crate::models::{
    Actor, DamageEntry, DeathEntry, Fight, FightTiming, HealingEntry, ReportCode, ReportSummary,
};
use crate::query;

const FIGHTS_PATH: &[&str] = &["data", "reportData", "report", "fights"];
const ROSTER_PATH: &[&str] = &["data", "reportData", "report", "masterData", "actors"];
const TABLE_ENTRIES_PATH: &[&str] = &["data", "reportData", "report", "table", "data", "entries"];
const REPORT_START_PATH: &[&str] = &["data", "reportData", "report", "startTime"];
const REPORTS_PATH: &[&str] = &["data", "reportData", "reports", "data"];

/// Walks `path` through nested objects. Null counts as absent.
pub(crate) fn value_at<'a>(envelope: &'a Value, path: &[&str]) -> Result<&'a Value, FetchError> {
    let mut current = envelope;
    for (depth, key) in path.iter().enumerate() {
        match current.get(key) {
            Some(next) if !next.is_null() => current = next,
            _ => {
                return Err(FetchError::MissingPath {
                    path: path[..=depth].join("."),
                })
            }
        }
    }
    Ok(current)
}

/// Extracts the array at `path` as uniformly-shaped records.
pub fn extract_records<T: DeserializeOwned>(
    envelope: &Value,
    path: &[&str],
) -> Result<Vec<T>, FetchError> {
    let value = value_at(envelope, path)?;
    Vec::<T>::deserialize(value).map_err(|source| FetchError::Shape {
        path: path.join("."),
        source,
    })
}

fn extract_scalar<T: DeserializeOwned>(envelope: &Value, path: &[&str]) -> Result<T, FetchError> {
    let value = value_at(envelope, path)?;
    T::deserialize(value).map_err(|source| FetchError::Shape {
        path: path.join("."),
        source,
    })
}

/// Facet accessor for one report.
pub struct ReportFacets<'a, T> {
    transport: &'a T,
    code: &'a ReportCode,
}

impl<'a, T: GraphQlTransport> ReportFacets<'a, T> {
    pub fn new(transport: &'a T, code: &'a ReportCode) -> Self {
        Self { transport, code }
    }

    pub fn code(&self) -> &ReportCode {
        self.code
    }

    async fn records<R: DeserializeOwned>(
        &self,
        query: String,
        path: &[&str],
    ) -> Result<Vec<R>, FetchError> {
        let envelope = self.transport.execute(&query).await?;
        let records = extract_records(&envelope, path)?;
        debug!(
            "{}: {} records at {}",
            self.code,
            records.len(),
            path.join(".")
        );
        Ok(records)
    }

    /// Keystone fights of the report, in API order.
    pub async fn fights(&self) -> Result<Vec<Fight>, FetchError> {
        self.records(query::fight_list(self.code.as_str()), FIGHTS_PATH)
            .await
    }

    /// Player actors of the whole report.
    pub async fn roster(&self) -> Result<Vec<Actor>, FetchError> {
        self.records(query::roster(self.code.as_str()), ROSTER_PATH)
            .await
    }

    pub async fn damage(&self, fight_id: i64) -> Result<Vec<DamageEntry>, FetchError> {
        self.records(
            query::damage_table(self.code.as_str(), fight_id),
            TABLE_ENTRIES_PATH,
        )
        .await
    }

    pub async fn healing(&self, fight_id: i64) -> Result<Vec<HealingEntry>, FetchError> {
        self.records(
            query::healing_table(self.code.as_str(), fight_id),
            TABLE_ENTRIES_PATH,
        )
        .await
    }

    /// Death events of one fight; a fight without deaths yields an empty list.
    pub async fn deaths(&self, fight_id: i64) -> Result<Vec<DeathEntry>, FetchError> {
        self.records(
            query::deaths_table(self.code.as_str(), fight_id),
            TABLE_ENTRIES_PATH,
        )
        .await
    }

    /// Report start in whole epoch seconds (milliseconds / 1000, rounded half to even).
    pub async fn report_start_secs(&self) -> Result<i64, FetchError> {
        let envelope = self
            .transport
            .execute(&query::report_start(self.code.as_str()))
            .await?;
        let start_ms: f64 = extract_scalar(&envelope, REPORT_START_PATH)?;
        Ok((start_ms / 1000.0).round_ties_even() as i64)
    }

    /// Fight start in milliseconds relative to the report start.
    pub async fn fight_start_offset_ms(&self, fight_id: i64) -> Result<f64, FetchError> {
        let timings: Vec<FightTiming> = self
            .records(query::fight_start(self.code.as_str(), fight_id), FIGHTS_PATH)
            .await?;
        timings
            .first()
            .map(|timing| timing.start_time)
            .ok_or_else(|| FetchError::MissingPath {
                path: format!("{}[0]", FIGHTS_PATH.join(".")),
            })
    }
}

/// Most recent reports of one uploader.
pub async fn fetch_uploader_reports<T: GraphQlTransport>(
    transport: &T,
    user_id: &str,
    limit: u32,
) -> Result<Vec<ReportSummary>, FetchError> {
    let envelope = transport
        .execute(&query::uploader_reports(user_id, limit))
        .await?;
    extract_records(&envelope, REPORTS_PATH)
}
