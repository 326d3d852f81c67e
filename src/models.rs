//! Data model shared across the pipeline.
//!
//! Wire records mirror the nested JSON returned by the API (camelCase field names),
//! while `CharacterFightRecord` is the flat row that is staged and appended to the
//! dataset.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DUNGEON_GROUP_SIZE;

/// Opaque identifier of one uploaded report.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportCode(String);

impl ReportCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReportCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for ReportCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl AsRef<str> for ReportCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One entry of an uploader's recent report listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub code: ReportCode,
    #[serde(default)]
    pub title: Option<String>,
    /// Milliseconds since the Unix epoch
    pub start_time: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameZone {
    #[serde(default)]
    pub name: Option<String>,
}

/// One fight of a report as returned by the fight list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fight {
    pub id: i64,
    /// Report-local actor ids of the friendly players; null for some non-combat fights
    #[serde(default)]
    pub friendly_players: Option<Vec<i64>>,
    #[serde(default)]
    pub game_zone: Option<GameZone>,
    #[serde(default)]
    pub difficulty: Option<i64>,
    #[serde(default)]
    pub keystone_level: Option<i64>,
}

impl Fight {
    /// Participant actor ids as a set.
    pub fn participants(&self) -> HashSet<i64> {
        self.friendly_players
            .as_deref()
            .unwrap_or_default()
            .iter()
            .copied()
            .collect()
    }

    /// Whether this fight is a five-player dungeon run.
    pub fn is_dungeon_run(&self) -> bool {
        self.friendly_players
            .as_ref()
            .is_some_and(|players| players.len() == DUNGEON_GROUP_SIZE)
    }

    pub fn zone_name(&self) -> Option<&str> {
        self.game_zone.as_ref().and_then(|zone| zone.name.as_deref())
    }
}

/// Offset of a fight from its report's start.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightTiming {
    pub id: i64,
    /// Milliseconds relative to the report start
    pub start_time: f64,
}

/// A player actor of a report roster.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub name: String,
    #[serde(rename = "gameID")]
    pub game_id: i64,
    /// Report-local actor id
    pub id: i64,
}

/// Damage-done table entry for one actor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageEntry {
    pub name: String,
    #[serde(default)]
    pub id: Option<i64>,
    /// Class label (`type` on the wire)
    #[serde(rename = "type", default)]
    pub class: Option<String>,
    #[serde(default)]
    pub item_level: Option<f64>,
    pub total: f64,
}

/// Healing table entry for one actor.
#[derive(Debug, Clone, Deserialize)]
pub struct HealingEntry {
    pub name: String,
    #[serde(default)]
    pub id: Option<i64>,
    pub total: f64,
}

/// One death event; an actor dying twice appears twice.
#[derive(Debug, Clone, Deserialize)]
pub struct DeathEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
}

/// One row per actor per fight: the unit appended to the dataset.
///
/// Metric fields are `None` for actors who appear in the roster but not in the
/// damage/healing merge. `deaths` is always set for roster actors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterFightRecord {
    pub report_code: ReportCode,
    pub fight_id: i64,
    pub dungeon_name: String,
    pub keystone_level: Option<i64>,
    /// Absolute fight start (UTC, millisecond precision)
    pub start_time: DateTime<Utc>,
    pub name: String,
    pub game_id: Option<i64>,
    pub actor_id: Option<i64>,
    pub class: Option<String>,
    pub item_level: Option<f64>,
    pub damage_done: Option<f64>,
    pub healing_done: Option<f64>,
    pub deaths: Option<u32>,
}

/// Durable snapshot of one report's records, as written to staging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedReport {
    pub report_code: ReportCode,
    #[serde(rename = "Data")]
    pub data: Vec<CharacterFightRecord>,
}

/// A record read back from the dataset together with its partition date.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub run_date: NaiveDate,
    pub record: CharacterFightRecord,
}
